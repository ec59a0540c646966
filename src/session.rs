use std::io::{BufRead, Write};

use crate::{
    error::Result,
    hmm::{tag::tokenize_words, tagger::Tagger},
};

const PROMPT: &str = "Insert sentence to tag; Press Q to quit";

/// Line-oriented tagging loop: one sentence in, one line of tags out, until
/// the user types `q`.
pub struct InteractiveSession<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveSession<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Returns the number of sentences tagged. A sentence that cannot be
    /// decoded prints its error and the loop goes on.
    pub fn run<T: Tagger + ?Sized>(&mut self, tagger: &T) -> Result<usize> {
        writeln!(self.output, "{PROMPT}")?;
        let mut count = 0;
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let sentence = line.trim();
            if sentence.is_empty() {
                continue;
            }
            if sentence.eq_ignore_ascii_case("q") {
                break;
            }
            match tagger.tag(&tokenize_words(sentence)) {
                Ok(decoding) => {
                    let tags: Vec<String> = decoding.tags.iter().map(ToString::to_string).collect();
                    writeln!(self.output, "{}", tags.join(" "))?;
                    count += 1;
                }
                Err(e) => writeln!(self.output, "error: {e}")?,
            }
            self.output.flush()?;
        }
        writeln!(self.output, "Session completed")?;
        Ok(count)
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::{trainer::ModelTrainer, viterbi::ViterbiDecoder};

    fn run(input: &str) -> (usize, String) {
        let model = ModelTrainer::train([("DET N V", "the dog runs")]).unwrap();
        let decoder = ViterbiDecoder::new(&model, -10.0).unwrap();
        let mut session = InteractiveSession::new(input.as_bytes(), Vec::new());
        let n = session.run(&decoder).unwrap();
        let (_, out) = session.into_inner();
        (n, String::from_utf8(out).unwrap())
    }

    #[test]
    fn quits_on_sentinel() {
        let (n, out) = run("The dog runs\n\nQ\nthe dog runs\n");
        assert_eq!(n, 1);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines, [PROMPT, "DET N V", "Session completed"]);
    }

    #[test]
    fn reports_failures_and_continues() {
        let (n, out) = run("the dog runs away\nthe dog\n");
        assert_eq!(n, 1);
        assert!(out.contains("error: no path found"), "{out}");
        assert!(out.contains("DET N\n"), "{out}");
    }
}
