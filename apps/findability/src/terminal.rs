//! Terminal stand-in for the browser form: prompts for fields, prints results.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use client_core::{FormSnapshot, FormView, ResultsView};
use shared::{
    domain::CompanyForm,
    signals::{SignalInput, SIGNAL_CATALOG},
};

pub const SUBMIT_LABEL: &str = "Evaluate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Html,
}

pub struct TerminalForm {
    snapshot: FormSnapshot,
    label: String,
    enabled: bool,
    format: OutputFormat,
}

impl TerminalForm {
    pub fn new(snapshot: FormSnapshot, format: OutputFormat) -> Self {
        Self {
            snapshot,
            label: SUBMIT_LABEL.to_string(),
            enabled: true,
            format,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl FormView for TerminalForm {
    fn read_form(&self) -> FormSnapshot {
        self.snapshot.clone()
    }

    fn submit_label(&self) -> String {
        self.label.clone()
    }

    fn set_submit_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn render_results(&mut self, view: &ResultsView) {
        let rendered = match self.format {
            OutputFormat::Html => view.to_html(),
            OutputFormat::Text => view.to_text(),
        };
        match view {
            ResultsView::Evaluation(_) => println!("{rendered}"),
            ResultsView::Status { .. } => eprintln!("{rendered}"),
        }
    }

    fn focus_name(&mut self) {
        eprintln!("hint: pass --name, or leave it off to be prompted");
    }
}

/// Builds the signal inputs for flag-driven runs: every catalog signal is a
/// checkbox, checked when named; unknown names become extra checked inputs.
pub fn signals_from_flags(checked: &[String]) -> Vec<SignalInput> {
    let mut inputs: Vec<SignalInput> = SIGNAL_CATALOG
        .iter()
        .map(|spec| SignalInput::new(spec.ui_key, checked.iter().any(|c| c == spec.ui_key)))
        .collect();
    for key in checked {
        if !inputs.iter().any(|input| &input.key == key) {
            inputs.push(SignalInput::new(key.clone(), true));
        }
    }
    inputs
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read from stdin")?;
        if read == 0 {
            bail!("input closed before the form was complete");
        }
        Ok(line.trim().to_string())
    }

    pub fn prompt_yes_no(&mut self, message: &str) -> Result<bool> {
        loop {
            let answer = self.prompt(&format!("{message} [y/n]: "))?.to_lowercase();
            match answer.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer y/yes or n/no.")?,
            }
        }
    }

    pub fn collect_form(&mut self) -> Result<FormSnapshot> {
        writeln!(
            self.output,
            "Let's grab the company details (only name is required)."
        )?;
        let mut name = String::new();
        while name.is_empty() {
            name = self.prompt("Name: ")?;
            if name.is_empty() {
                writeln!(self.output, "Name is required.")?;
            }
        }

        let company = CompanyForm {
            name: Some(name),
            website: Some(self.prompt("Website (optional): ")?),
            country: Some(self.prompt("Country (optional): ")?),
            state: Some(self.prompt("State (optional): ")?),
            city: Some(self.prompt("City (optional): ")?),
            industry: Some(self.prompt("Industry (optional): ")?),
            niche: Some(self.prompt("Niche (optional): ")?),
        };

        writeln!(self.output, "Now a few quick signals, just y/n.")?;
        let mut signals = Vec::with_capacity(SIGNAL_CATALOG.len());
        for spec in SIGNAL_CATALOG {
            let checked = self.prompt_yes_no(&format!("Does it have: {}?", spec.label))?;
            signals.push(SignalInput::new(spec.ui_key, checked));
        }

        Ok(FormSnapshot { company, signals })
    }
}
