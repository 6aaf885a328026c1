//! TOML-described rendering scenarios.
//!
//! A scenario is a list of recorder operations plus what collecting the
//! resulting document should produce:
//!
//! ```toml
//! name = "nested marks"
//! stack = [{ file = "lib.rs", line = 9 }]
//!
//! [[steps]]
//! op = "begin"
//! parts = ["<div>"]
//! frames = [{ file = "page.rs", line = 1 }]
//!
//! [[steps]]
//! op = "end"
//!
//! [expect]
//! frames = 1
//! mappings = 1
//! forest = "0"
//! ```

use core_types::Frame;
use recorder::{FixedStack, Recorder};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tools::escape::escape_attr;

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Open a mapping and write its text.
    Begin {
        parts: Vec<String>,
        #[serde(default)]
        frames: Option<Vec<Frame>>,
    },
    /// Close the innermost open mapping.
    End,
    /// Open, write and close in one go.
    Print {
        parts: Vec<String>,
        #[serde(default)]
        frames: Option<Vec<Frame>>,
    },
    Push {
        frame: Frame,
    },
    Pop,
    /// Raw markup, unrecorded.
    Write {
        markup: String,
    },
    /// `<tag name="value" …marker attributes…></tag>`
    Attribute {
        tag: String,
        name: String,
        parts: Vec<String>,
        #[serde(default)]
        frames: Option<Vec<Frame>>,
    },
}

#[derive(Clone, Debug, Deserialize)]
pub struct NearestCase {
    /// Text of the node to start from.
    pub text: String,
    pub mapping: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Expect {
    pub frames: Option<usize>,
    pub mappings: Option<usize>,
    pub forest: Option<String>,
    pub call_stacks: Option<Vec<Vec<usize>>>,
    pub nearest: Vec<NearestCase>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// What the recorder's call-stack source captures for unframed marks.
    #[serde(default)]
    pub stack: Vec<Frame>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub expect: Expect,
}

fn joined(parts: &[String]) -> Vec<&str> {
    parts.iter().map(String::as_str).collect()
}

impl Scenario {
    /// Drive a fresh recorder through the steps. Marks left open stay open;
    /// [`Recorder::finish`] closes them.
    pub fn record(&self) -> Recorder {
        let mut rec = Recorder::new().with_source(FixedStack(self.stack.clone()));
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Begin { parts, frames } => {
                    let mark = rec.begin_mark(frames.as_deref(), &joined(parts));
                    rec.write(&mark.text);
                }
                Step::End => {
                    let Some(&id) = rec.open_marks().last() else {
                        panic!("{}: step {index} ends with nothing open", self.name);
                    };
                    rec.end_mark(id)
                        .unwrap_or_else(|err| panic!("{}: step {index}: {err}", self.name));
                }
                Step::Print { parts, frames } => match frames {
                    Some(frames) => {
                        rec.mark_chunk(frames, &parts.join(" "));
                    }
                    None => {
                        rec.print(&joined(parts));
                    }
                },
                Step::Push { frame } => rec.push_frame(frame.clone()),
                Step::Pop => {
                    rec.pop_frame();
                }
                Step::Write { markup } => rec.write(markup),
                Step::Attribute {
                    tag,
                    name,
                    parts,
                    frames,
                } => {
                    let mark = rec.attribute_mark(name, frames.as_deref(), &joined(parts));
                    let value = escape_attr(&mark.value);
                    rec.write(&format!("<{tag} {name}=\"{value}\"{}></{tag}>", mark.markup()));
                }
            }
        }
        rec
    }
}

pub fn load_scenario(path: &Path) -> Scenario {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read scenario {path:?}: {err}"));
    toml::from_str(&content).unwrap_or_else(|err| panic!("invalid scenario {path:?}: {err}"))
}

/// Every `*.toml` scenario in `dir`, sorted by path.
pub fn load_scenarios(dir: &Path) -> Vec<(PathBuf, Scenario)> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read scenario dir {dir:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no scenarios found in {dir:?}");
    paths
        .into_iter()
        .map(|path| {
            let scenario = load_scenario(&path);
            (path, scenario)
        })
        .collect()
}
