//! Random hypothetical matchups and a running model scorecard for `pickem play`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::io::Write;

use crate::features::{ConferenceMap, Matchup};
use crate::{AnalysisConfig, PickemError, Result, TeamId};

/// Probability that a generated game is played indoors
const INDOOR_PROBABILITY: f64 = 0.3;
/// Probability of rain or snow at an outdoor game
const PRECIPITATION_PROBABILITY: f64 = 0.15;
const MAX_WIND_MPH: u32 = 25;
/// Spreads run from -10 to +10 in half-point steps
const SPREAD_STEPS: u32 = 40;

/// Draws plausible games between roster teams
pub struct ScenarioGenerator {
    teams: Vec<TeamId>,
    conferences: ConferenceMap,
    season_weeks: u32,
    temperature: f32,
    rng: StdRng,
}

impl ScenarioGenerator {
    /// `seed` makes the sequence reproducible; None seeds from the OS
    pub fn new(
        teams: Vec<TeamId>,
        conferences: ConferenceMap,
        analysis: &AnalysisConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        if teams.len() < 2 {
            return Err(PickemError::Config(
                "Need at least two teams to generate matchups".to_string(),
            ));
        }
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Ok(ScenarioGenerator {
            teams,
            conferences,
            season_weeks: analysis.season_weeks.max(1),
            temperature: analysis.default_temperature,
            rng,
        })
    }

    pub fn next_matchup(&mut self) -> Matchup {
        let away_idx = self.rng.gen_range(0..self.teams.len());
        // Pick among the remaining teams by skipping over the away slot
        let mut home_idx = self.rng.gen_range(0..self.teams.len() - 1);
        if home_idx >= away_idx {
            home_idx += 1;
        }
        let away = self.teams[away_idx].clone();
        let home = self.teams[home_idx].clone();

        let spread = self.rng.gen_range(0..=SPREAD_STEPS) as f32 * 0.5 - 10.0;
        let week = self.rng.gen_range(1..=self.season_weeks);
        let indoor = self.rng.gen_bool(INDOOR_PROBABILITY);
        let wind_mph = if indoor {
            0.0
        } else {
            self.rng.gen_range(0..=MAX_WIND_MPH) as f32
        };
        let rain_snow = !indoor && self.rng.gen_bool(PRECIPITATION_PROBABILITY);
        let cross_conference = self.conferences.is_cross_conference(&home, &away);

        Matchup {
            home,
            away,
            spread,
            week,
            indoor,
            temperature: self.temperature,
            wind_mph,
            rain_snow,
            cross_conference,
        }
    }
}

/// One-line description such as "Week 5: BUF @ NE | NE -3.5 | 12 mph wind | Same conference"
pub fn describe_matchup(matchup: &Matchup) -> String {
    let line = if matchup.spread < 0.0 {
        format!("{} {:+.1}", matchup.home, matchup.spread)
    } else if matchup.spread > 0.0 {
        format!("{} {:+.1}", matchup.away, -matchup.spread)
    } else {
        "Pick'em".to_string()
    };

    let mut weather = if matchup.indoor {
        "Indoor".to_string()
    } else {
        format!("{:.0} mph wind", matchup.wind_mph)
    };
    if matchup.rain_snow {
        weather.push_str(", rain/snow");
    }

    let conference = if matchup.cross_conference {
        "Cross-conference"
    } else {
        "Same conference"
    };

    format!(
        "Week {}: {} @ {} | {} | {} | {}",
        matchup.week, matchup.away, matchup.home, line, weather, conference
    )
}

/// How often the model called the participant's actual pick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scorecard {
    pub total: usize,
    pub correct: usize,
}

impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one round; returns whether the model was right
    pub fn record(&mut self, model_pick: &TeamId, actual_pick: &TeamId) -> bool {
        let hit = model_pick == actual_pick;
        self.total += 1;
        if hit {
            self.correct += 1;
        }
        hit
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Scorecard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model score: {}/{} correct", self.correct, self.total)?;
        if self.total > 0 {
            write!(f, " ({:.0}%)", self.accuracy() * 100.0)?;
        }
        Ok(())
    }
}

/// A reply at the `pickem play` prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayAnswer {
    Pick(TeamId),
    Quit,
}

impl PlayAnswer {
    /// h/home, a/away or q/quit, case-insensitive; None for anything else
    pub fn parse(input: &str, matchup: &Matchup) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "h" | "home" => Some(PlayAnswer::Pick(matchup.home.clone())),
            "a" | "away" => Some(PlayAnswer::Pick(matchup.away.clone())),
            "q" | "quit" => Some(PlayAnswer::Quit),
            _ => None,
        }
    }
}

/// Prompt until a line parses, keeping the same matchup. None at end of input.
pub fn read_answer<I, W>(lines: &mut I, out: &mut W, matchup: &Matchup) -> Result<Option<PlayAnswer>>
where
    I: Iterator<Item = std::io::Result<String>>,
    W: Write,
{
    loop {
        write!(out, "  Your pick [h/a/q]: ")?;
        out.flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(None),
        };
        match PlayAnswer::parse(&line, matchup) {
            Some(answer) => return Ok(Some(answer)),
            None => writeln!(out, "  Unrecognized answer '{}', try again", line.trim())?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testutil::team;
    use crate::Config;

    fn generator(seed: u64) -> ScenarioGenerator {
        let config = Config::default();
        let conferences = ConferenceMap::new(
            &[team("NE", "AFC"), team("BUF", "AFC"), team("SF", "NFC")],
            "NFC",
        );
        ScenarioGenerator::new(
            config.roster.teams.clone(),
            conferences,
            &config.analysis,
            Some(seed),
        )
        .unwrap()
    }

    #[test]
    fn test_generated_matchups_are_valid() {
        let mut scenarios = generator(7);
        for _ in 0..500 {
            let m = scenarios.next_matchup();
            assert_ne!(m.home, m.away);
            assert!(m.spread >= -10.0 && m.spread <= 10.0);
            assert_eq!((m.spread * 2.0).fract(), 0.0);
            assert!(m.week >= 1 && m.week <= 18);
            assert_eq!(m.temperature, 65.0);
            if m.indoor {
                assert_eq!(m.wind_mph, 0.0);
                assert!(!m.rain_snow);
            } else {
                assert!(m.wind_mph <= 25.0);
            }
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = generator(42);
        let mut b = generator(42);
        for _ in 0..20 {
            assert_eq!(a.next_matchup(), b.next_matchup());
        }
    }

    #[test]
    fn test_needs_two_teams() {
        let config = Config::default();
        let conferences = ConferenceMap::new(std::iter::empty(), "NFC");
        let result = ScenarioGenerator::new(
            vec![TeamId::from("NE")],
            conferences,
            &config.analysis,
            Some(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_describe_matchup() {
        let config = Config::default();
        let mut m = Matchup::new(TeamId::from("NE"), TeamId::from("BUF"), -3.5, 5, &config.analysis);
        m.wind_mph = 12.0;
        assert_eq!(
            describe_matchup(&m),
            "Week 5: BUF @ NE | NE -3.5 | 12 mph wind | Same conference"
        );

        m.spread = 2.0;
        m.indoor = true;
        m.cross_conference = true;
        assert_eq!(
            describe_matchup(&m),
            "Week 5: BUF @ NE | BUF -2.0 | Indoor | Cross-conference"
        );
    }

    #[test]
    fn test_scorecard() {
        let mut card = Scorecard::new();
        assert_eq!(card.to_string(), "Model score: 0/0 correct");
        assert!(card.record(&TeamId::from("NE"), &TeamId::from("NE")));
        assert!(!card.record(&TeamId::from("NE"), &TeamId::from("BUF")));
        assert_eq!(card.accuracy(), 0.5);
        assert_eq!(card.to_string(), "Model score: 1/2 correct (50%)");
    }

    #[test]
    fn test_read_answer_reprompts_same_matchup() {
        let config = Config::default();
        let matchup = Matchup::new(TeamId::from("NE"), TeamId::from("BUF"), -3.5, 5, &config.analysis);
        let mut lines = vec!["x".to_string(), "".to_string(), " Away ".to_string()]
            .into_iter()
            .map(Ok);
        let mut out: Vec<u8> = Vec::new();

        let answer = read_answer(&mut lines, &mut out, &matchup).unwrap();
        assert_eq!(answer, Some(PlayAnswer::Pick(TeamId::from("BUF"))));

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Your pick").count(), 3);
        assert_eq!(text.matches("Unrecognized answer").count(), 2);
    }

    #[test]
    fn test_read_answer_quit_and_end_of_input() {
        let config = Config::default();
        let matchup = Matchup::new(TeamId::from("NE"), TeamId::from("BUF"), 0.0, 1, &config.analysis);

        let mut quit = vec![Ok("Q".to_string())].into_iter();
        let answer = read_answer(&mut quit, &mut Vec::<u8>::new(), &matchup).unwrap();
        assert_eq!(answer, Some(PlayAnswer::Quit));

        let mut empty = std::iter::empty();
        assert_eq!(read_answer(&mut empty, &mut Vec::<u8>::new(), &matchup).unwrap(), None);
        assert_eq!(
            PlayAnswer::parse("h", &matchup),
            Some(PlayAnswer::Pick(TeamId::from("NE")))
        );
    }
}
