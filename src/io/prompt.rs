use dialoguer::Input;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::core::resolution::OperatorIo;
use crate::error::{DedupError, Result};

/// Interactive operator on the controlling terminal. Blocks until a line
/// of input arrives. Piped stdin is read line by line; end of input is a
/// prompt failure.
#[derive(Debug, Default)]
pub struct TerminalOperator {
    to_stderr: bool,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the conversation off stdout, e.g. when stdout carries a report.
    pub fn with_stderr(mut self, to_stderr: bool) -> Self {
        self.to_stderr = to_stderr;
        self
    }

    fn output(&self) -> Box<dyn Write> {
        if self.to_stderr {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }

    fn say(&self, line: &str) {
        let _ = writeln!(self.output(), "{}", line);
    }

    fn read_piped_line(&self, prompt: &str) -> Result<String> {
        let mut out = self.output();
        write!(out, "{}: ", prompt)
            .and_then(|_| out.flush())
            .map_err(|e| DedupError::Prompt(e.to_string()))?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| DedupError::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(DedupError::Prompt("standard input closed".to_string()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl OperatorIo for TerminalOperator {
    fn ask(&mut self, prompt: &str, accepted: &[&str]) -> Result<String> {
        let prompt = format!("{} [{}]", prompt, accepted.join("/"));
        if !io::stdin().is_terminal() {
            return self.read_piped_line(&prompt);
        }

        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| DedupError::Prompt(e.to_string()))
    }

    fn notify(&mut self, message: &str) {
        self.say(message);
    }

    fn preview(&mut self, path: &Path) {
        match image::image_dimensions(path) {
            Ok((width, height)) => {
                self.say(&format!("   🖼  {} ({}x{})", path.display(), width, height))
            }
            Err(_) => self.say(&format!("   🖼  {}", path.display())),
        }
    }
}

/// Replays canned responses; runs the resolution workflow without a terminal.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    responses: VecDeque<String>,
    messages: Vec<String>,
    previewed: Vec<PathBuf>,
}

impl ScriptedOperator {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn previewed(&self) -> &[PathBuf] {
        &self.previewed
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl OperatorIo for ScriptedOperator {
    fn ask(&mut self, prompt: &str, _accepted: &[&str]) -> Result<String> {
        self.messages.push(prompt.to_string());
        self.responses
            .pop_front()
            .ok_or_else(|| DedupError::Prompt("no scripted response left".to_string()))
    }

    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn preview(&mut self, path: &Path) {
        self.previewed.push(path.to_path_buf());
    }
}
