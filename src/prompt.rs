/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::prompt
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Tri-state interactive confirmation over an injectable
    answer source, so destructive flows are testable without
    console I/O.

  Security / Safety Notes:
    The default answer is "no": an empty reply declines. Only
    an explicit yes proceeds; anything unrecognised is treated
    as operator error, not declination.

  Dependencies:
    std::io for the stdin-backed source.

  Operational Scope:
    Used by the switch and uninstall flows. Dry-run does not
    bypass prompts.

  Revision History:
    2025-11-19 COD  Authored confirmation abstraction.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Conservative defaults for destructive operations
    - Seams injected for deterministic testing
============================================================*/

use std::io::{BufRead, Write};

use crate::error::Result;

/// Classification of an operator's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
    /// Unrecognised input, carried for the diagnostic.
    Invalid(String),
}

/// Source of interactive answers; stdin in production, scripted in tests.
pub trait AnswerSource {
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Blocking stdin prompt.
pub struct StdinAnswers;

impl AnswerSource for StdinAnswers {
    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question} ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

/// Ask and classify. Empty input and explicit no both decline;
/// anything else unrecognised is Invalid.
pub fn confirm(source: &mut dyn AnswerSource, question: &str) -> Result<Confirmation> {
    let raw = source.ask(question)?;
    Ok(classify(&raw))
}

pub fn classify(raw: &str) -> Confirmation {
    let answer = raw.trim().to_ascii_lowercase();
    match answer.as_str() {
        "y" | "yes" => Confirmation::Confirmed,
        "" | "n" | "no" => Confirmation::Declined,
        _ => Confirmation::Invalid(answer),
    }
}

#[cfg(test)]
pub mod scripted {
    use std::collections::VecDeque;

    use super::AnswerSource;
    use crate::error::Result;

    /// Serves pre-seeded answers in order.
    pub struct ScriptedAnswers {
        answers: VecDeque<String>,
    }

    impl ScriptedAnswers {
        pub fn new<I: IntoIterator<Item = &'static str>>(answers: I) -> Self {
            Self {
                answers: answers.into_iter().map(|a| a.to_string()).collect(),
            }
        }
    }

    impl AnswerSource for ScriptedAnswers {
        fn ask(&mut self, _question: &str) -> Result<String> {
            Ok(self.answers.pop_front().unwrap_or_default())
        }
    }
}
