//! Controller scripts: timed accept and override decisions for a run.

use crate::railway::advisor::{AdviceKind, Recommendation, RecommendationId};
use crate::railway::train::TrainId;
use regex::Regex;

#[derive(Debug, Default)]
pub struct Script {
    pub actions: Vec<ScriptAction>,
}

#[derive(Debug, PartialEq)]
pub enum ScriptAction {
    Wait(f64),
    Accept(Selector),
    Override(Selector),
}

/// Which active recommendation a scripted decision refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Top,
    Id(RecommendationId),
    Target(AdviceKind, TrainId),
}

impl Selector {
    pub fn resolve(&self, active: &[Recommendation]) -> Option<RecommendationId> {
        match self {
            Selector::Top => active.first().map(|r| r.id),
            Selector::Id(id) => active.iter().find(|r| r.id == *id).map(|r| r.id),
            Selector::Target(kind, train) => active
                .iter()
                .find(|r| r.advice.kind() == *kind && &r.train == train)
                .map(|r| r.id),
        }
    }
}

#[derive(Debug, Fail, PartialEq)]
pub enum ScriptError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "error converting number on line {}", _0)]
    NumberError(usize),
    #[fail(display = "unrecognized script line {}: {}", _0, _1)]
    Unrecognized(usize, String),
}

/// Parses a controller script.
///
/// * wait 5.0
/// * accept top
/// * accept depart T515
/// * override #12
///
pub fn parse_script(input: &str) -> Result<Script, ScriptError> {
    let re = |s: &str| Regex::new(s).map_err(|e| ScriptError::RegexError(format!("{:?}", e)));
    let wait_re = re(r"^\s*wait\s+([\d\.]+)\s*$")?;
    let decision_re = re(r"(?x) ^ \s* (?P<verb>accept|override) \s+
            (?: (?P<top>top)
              | \#(?P<id>\d+)
              | (?P<kind>depart|stop|halt) \s+ (?P<train>\w+) )
            \s* $")?;

    let mut actions = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(groups) = wait_re.captures(line) {
            let t = groups[1].parse::<f64>().map_err(|_| ScriptError::NumberError(lineno))?;
            actions.push(ScriptAction::Wait(t));
            continue;
        }
        if let Some(groups) = decision_re.captures(line) {
            let selector = if groups.name("top").is_some() {
                Selector::Top
            } else if let Some(id) = groups.name("id") {
                Selector::Id(id.as_str().parse().map_err(|_| ScriptError::NumberError(lineno))?)
            } else {
                let kind = match &groups["kind"] {
                    "depart" => AdviceKind::Depart,
                    "stop" => AdviceKind::StationStop,
                    _ => AdviceKind::ConvergenceHalt,
                };
                Selector::Target(kind, groups["train"].to_string())
            };
            actions.push(match &groups["verb"] {
                "accept" => ScriptAction::Accept(selector),
                _ => ScriptAction::Override(selector),
            });
            continue;
        }
        return Err(ScriptError::Unrecognized(lineno, line.to_string()));
    }

    Ok(Script { actions })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_forms() {
        let s = parse_script(
            "wait 5.0\n\n# start the fastest\naccept top\naccept depart T515\noverride #12\n  accept stop T789  \noverride halt T212\n",
        )
        .unwrap();
        assert_eq!(
            s.actions,
            vec![
                ScriptAction::Wait(5.0),
                ScriptAction::Accept(Selector::Top),
                ScriptAction::Accept(Selector::Target(AdviceKind::Depart, "T515".into())),
                ScriptAction::Override(Selector::Id(12)),
                ScriptAction::Accept(Selector::Target(AdviceKind::StationStop, "T789".into())),
                ScriptAction::Override(Selector::Target(AdviceKind::ConvergenceHalt, "T212".into())),
            ]
        );
    }

    #[test]
    fn reports_bad_lines() {
        assert_eq!(
            parse_script("wait 1\nreroute T1").unwrap_err(),
            ScriptError::Unrecognized(2, "reroute T1".into())
        );
        assert_eq!(parse_script("wait 1.2.3").unwrap_err(), ScriptError::NumberError(1));
        assert!(parse_script("accept").is_err());
    }

    #[test]
    fn selectors_only_resolve_active_entries() {
        use crate::input::topology::{Topology, Track};
        use crate::railway::advisor::generate;
        use crate::railway::train::{Train, TrainStore};
        use crate::railway::ControlParams;

        let topology = Topology::new(vec![Track::new("a", None, "M 0,0 L 100,0").unwrap()], vec![], vec![]);
        let store = TrainStore::new(vec![Train::new("T1", "a", 80.0)]);
        let active = generate(&store, &topology, &ControlParams::default(), &[], &mut 0);
        let id = active[0].id;

        assert_eq!(Selector::Top.resolve(&active), Some(id));
        assert_eq!(Selector::Id(id).resolve(&active), Some(id));
        assert_eq!(Selector::Id(id + 1).resolve(&active), None);
        assert_eq!(Selector::Target(AdviceKind::Depart, "T1".into()).resolve(&active), Some(id));
        assert_eq!(Selector::Target(AdviceKind::ConvergenceHalt, "T1".into()).resolve(&active), None);
        assert_eq!(Selector::Id(id).resolve(&[]), None);
    }
}
