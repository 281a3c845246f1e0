use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

const INVALID_INPUT: &str = "Invalid input. Please try again.";
const RESTART_PROMPT: &str = "\nWould you like to restart? Enter 'yes' or 'no': ";

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("input closed while waiting for an answer to {prompt:?}")]
    InputClosed { prompt: String },
}

pub type Result<T> = std::result::Result<T, PromptError>;

// ---------------------------------------------------------------------------
// Prompter – line-oriented console I/O
// ---------------------------------------------------------------------------

/// Reads answers from `input` and writes prompts and messages to `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Writer for non-prompt console output.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Show `prompt` and read one line. `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Keep prompting until the trimmed answer is one of `options`.
    ///
    /// With `case_insensitive` both sides are lower-cased before comparing and
    /// the accepted answer is returned lower-cased; otherwise it is returned as
    /// typed (minus surrounding whitespace). There is no retry limit; the loop
    /// only ends early if the input stream closes.
    pub fn input_validated<I, S>(
        &mut self,
        prompt: &str,
        options: I,
        case_insensitive: bool,
    ) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalize = |s: &str| {
            if case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let allowed: BTreeSet<String> = options
            .into_iter()
            .map(|o| normalize(o.as_ref()))
            .collect();

        loop {
            let Some(line) = self.read_line(prompt)? else {
                return Err(PromptError::InputClosed {
                    prompt: prompt.trim().to_string(),
                });
            };
            let answer = normalize(line.trim());
            if allowed.contains(&answer) {
                return Ok(answer);
            }
            log::debug!("rejected answer {:?}", line.trim());
            writeln!(self.output, "{INVALID_INPUT}")?;
        }
    }

    /// Ask whether to run another analysis. Only `yes` (any casing) restarts;
    /// anything else, including end of input, means no.
    pub fn ask_restart(&mut self) -> Result<bool> {
        let answer = self.read_line(RESTART_PROMPT)?.unwrap_or_default();
        Ok(answer.trim().to_lowercase() == "yes")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const CITIES: [&str; 3] = ["chicago", "new york city", "washington"];

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn transcript(p: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.into_parts().1).unwrap()
    }

    #[test]
    fn accepts_any_casing_with_surrounding_whitespace() {
        for (typed, expected) in [
            ("Chicago\n", "chicago"),
            ("  NEW YORK CITY  \n", "new york city"),
            ("\tWashington\r\n", "washington"),
            ("wAsHiNgToN", "washington"),
        ] {
            let mut p = prompter(typed);
            let got = p.input_validated("City: ", CITIES, true).unwrap();
            assert_eq!(got, expected, "input {typed:?}");
        }
    }

    #[test]
    fn reprompts_once_per_invalid_answer() {
        let mut p = prompter("boston\n\nnyc\n42\nchicago\n");
        let got = p.input_validated("City: ", CITIES, true).unwrap();
        assert_eq!(got, "chicago");

        let out = transcript(p);
        assert_eq!(out.matches(INVALID_INPUT).count(), 4);
        assert_eq!(out.matches("City: ").count(), 5);
    }

    #[test]
    fn case_sensitive_mode_keeps_exact_spelling() {
        let mut p = prompter("chicago\nChicago\n");
        let got = p
            .input_validated("City: ", ["Chicago", "Washington"], false)
            .unwrap();
        assert_eq!(got, "Chicago");
        assert_eq!(transcript(p).matches(INVALID_INPUT).count(), 1);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut p = prompter("boston\n");
        let err = p.input_validated("City: ", CITIES, true).unwrap_err();
        assert!(matches!(err, PromptError::InputClosed { .. }));
    }

    #[test]
    fn only_yes_restarts() {
        assert!(prompter(" YES \n").ask_restart().unwrap());
        assert!(!prompter("no\n").ask_restart().unwrap());
        assert!(!prompter("y\n").ask_restart().unwrap());
        assert!(!prompter("\n").ask_restart().unwrap());
        assert!(!prompter("").ask_restart().unwrap());
    }
}
