//! `joran rules` command handler

use std::io::Write;

use serde::Serialize;

use joran_core::config::JoranConfig;
use joran_interpreter::JoranConfigurator;

use crate::cli::RulesArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `rules` command.
pub fn execute(args: RulesArgs, config: &JoranConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let configurator = JoranConfigurator::from_config(config);
    let report = RuleListReport::new(&configurator, args.classes);
    writer.render(&report)
}

#[derive(Debug, Serialize)]
pub struct RuleListReport {
    pub total: usize,
    pub rules: Vec<RuleEntry>,
    pub implicit_actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct RuleEntry {
    pub pattern: String,
    pub actions: Vec<String>,
}

impl RuleListReport {
    pub fn new(configurator: &JoranConfigurator, with_classes: bool) -> Self {
        let store = configurator.default_rule_store();
        let rules: Vec<RuleEntry> = store
            .rules()
            .map(|(pattern, actions)| RuleEntry {
                pattern: pattern.to_string(),
                actions: actions.iter().map(|a| a.name().to_owned()).collect(),
            })
            .collect();
        let implicit_actions = configurator
            .implicit_actions()
            .iter()
            .map(|a| a.name().to_owned())
            .collect();
        let classes = with_classes.then(|| {
            configurator
                .registry()
                .classes()
                .map(str::to_owned)
                .collect()
        });

        Self {
            total: rules.len(),
            rules,
            implicit_actions,
            classes,
        }
    }
}

impl Render for RuleListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rules ({} total)", self.total.to_string().bold())?;
        writeln!(w)?;
        writeln!(w, "{:<45} Actions", "Pattern")?;
        writeln!(w, "{}", "-".repeat(75))?;
        for r in &self.rules {
            let pattern = if r.pattern.starts_with('*') {
                r.pattern.cyan()
            } else {
                r.pattern.normal()
            };
            writeln!(w, "{:<45} {}", pattern, r.actions.join(", "))?;
        }

        writeln!(w)?;
        if self.implicit_actions.is_empty() {
            writeln!(w, "Implicit actions: {}", "none".yellow())?;
        } else {
            writeln!(w, "Implicit actions: {}", self.implicit_actions.join(", "))?;
        }

        if let Some(ref classes) = self.classes {
            writeln!(w)?;
            writeln!(w, "Component classes ({}):", classes.len())?;
            for class in classes {
                writeln!(w, "  {class}")?;
            }
        }

        Ok(())
    }
}
