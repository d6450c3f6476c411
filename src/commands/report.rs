use itertools::Itertools;

/// What happened to a single runner or workflow run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Skipped,
    Done,
    DryRun,
    Failed(String),
}

impl Outcome {
    fn kind(&self) -> &'static str {
        match self {
            Outcome::Skipped => "skipped",
            Outcome::Done => "done",
            Outcome::DryRun => "dry-run",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// Per-item outcomes of one fan-out, keyed by runner or run id.
#[derive(Debug, Default)]
pub struct Report {
    pub found: usize,
    pub outcomes: Vec<(u64, Outcome)>,
}

impl Report {
    pub fn ids(&self, pred: impl Fn(&Outcome) -> bool) -> Vec<u64> {
        self.outcomes
            .iter()
            .filter(|(_, o)| pred(o))
            .map(|(id, _)| *id)
            .sorted()
            .collect()
    }

    #[cfg(test)]
    pub fn failures(&self) -> Vec<(u64, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(id, o)| match o {
                Outcome::Failed(msg) => Some((*id, msg.as_str())),
                _ => None,
            })
            .collect()
    }

    /// One-line summary, e.g. `3 found, 1 deleted, 2 skipped, 0 failed`.
    pub fn summary(&self, done: &str) -> String {
        let counts = self.outcomes.iter().map(|(_, o)| o.kind()).counts();
        let count = |k: &str| counts.get(k).copied().unwrap_or(0);

        let mut parts = vec![
            format!("{} found", self.found),
            format!("{} {}", count("done"), done),
            format!("{} skipped", count("skipped")),
        ];
        if count("dry-run") > 0 {
            parts.push(format!("{} dry-run", count("dry-run")));
        }
        parts.push(format!("{} failed", count("failed")));
        parts.join(", ")
    }
}
