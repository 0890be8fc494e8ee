//! Scripted input for the headless driver
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   {"op": "press", "scancode": 4},
//!   {"op": "tap", "key": "Down"},
//!   {"op": "frames", "count": 3}
//! ]
//! ```

use anyhow::{bail, Context, Result};
use overlay_core::{keys, KeyEvent};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeySpec {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub scancode: Option<u16>,
}

impl KeySpec {
    pub fn press(&self) -> Result<KeyEvent> {
        Ok(KeyEvent::press(self.sym()?).with_scancode(self.scancode.unwrap_or(0)))
    }

    pub fn release(&self) -> Result<KeyEvent> {
        Ok(KeyEvent::release(self.sym()?).with_scancode(self.scancode.unwrap_or(0)))
    }

    fn sym(&self) -> Result<i32> {
        match (&self.key, self.scancode) {
            (Some(name), _) => match keys::from_name(name) {
                Some(code) => Ok(code),
                None => bail!("Unknown key name: {}", name),
            },
            (None, Some(_)) => Ok(0),
            (None, None) => bail!("Key step needs a key name or a scancode"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    Press(KeySpec),
    Release(KeySpec),
    /// Press immediately followed by release
    Tap(KeySpec),
    /// Render this many frames
    Frames { count: u32 },
}

impl Step {
    /// Key events this step delivers, in order
    pub fn events(&self) -> Result<Vec<KeyEvent>> {
        Ok(match self {
            Step::Press(spec) => vec![spec.press()?],
            Step::Release(spec) => vec![spec.release()?],
            Step::Tap(spec) => vec![spec.press()?, spec.release()?],
            Step::Frames { .. } => Vec::new(),
        })
    }
}

pub fn parse(json: &str) -> Result<Vec<Step>> {
    let steps: Vec<Step> = serde_json::from_str(json).context("Malformed script")?;
    // Surface bad key names before anything runs
    for (i, step) in steps.iter().enumerate() {
        step.events().with_context(|| format!("Script step {}", i))?;
    }
    Ok(steps)
}

pub fn load(path: &Path) -> Result<Vec<Step>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    parse(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::KeyEventKind;

    #[test]
    fn test_parse_all_step_kinds() {
        let steps = parse(
            r#"[
                {"op": "press", "scancode": 4},
                {"op": "tap", "key": "down"},
                {"op": "release", "key": "LeftCtrl", "scancode": 29},
                {"op": "frames", "count": 3}
            ]"#,
        )
        .unwrap();

        assert_eq!(steps.len(), 4);
        assert_eq!(steps[3], Step::Frames { count: 3 });

        let toggle = steps[0].events().unwrap();
        assert_eq!(toggle.len(), 1);
        assert_eq!(toggle[0].scancode, 4);
        assert_eq!(toggle[0].sym, 0);

        let tap = steps[1].events().unwrap();
        assert_eq!(tap.len(), 2);
        assert_eq!(tap[0].kind, KeyEventKind::Press);
        assert_eq!(tap[1].kind, KeyEventKind::Release);
        assert_eq!(tap[0].sym, keys::DOWN);

        let release = steps[2].events().unwrap();
        assert_eq!(release[0].sym, keys::LEFT_CTRL);
        assert_eq!(release[0].scancode, 29);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse(r#"[{"op": "tap", "key": "Nope"}]"#).unwrap_err();
        assert!(format!("{:#}", err).contains("Nope"));
    }

    #[test]
    fn test_key_step_needs_a_key() {
        assert!(parse(r#"[{"op": "press"}]"#).is_err());
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(parse(r#"[{"op": "wiggle"}]"#).is_err());
    }
}
