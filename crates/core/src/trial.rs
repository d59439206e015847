//! The trial: probe questions and the replies that pass them.

use std::error::Error;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// One trial question and the normalized replies that pass it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    /// The question sent on the player's behalf.
    pub question: String,
    /// Accepted replies, compared after [`normalize_reply`].
    pub accepted: Vec<String>,
}

impl Probe {
    /// Creates a probe.
    pub fn new<Q, I, A>(question: Q, accepted: I) -> Self
    where
        Q: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            question: question.into(),
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns whether `reply` passes this probe.
    pub fn accepts(&self, reply: &str) -> bool {
        let reply = normalize_reply(reply);
        self.accepted.iter().any(|a| normalize_reply(a) == reply)
    }
}

/// Normalizes a reply for comparison: lowercased, every `.` removed, and
/// surrounding whitespace trimmed.
pub fn normalize_reply(reply: &str) -> String {
    let lowered = reply.to_lowercase().replace('.', "");
    lowered.trim().to_owned()
}

/// An ordered, non-empty list of probes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Probe>", into = "Vec<Probe>")]
pub struct TrialSet {
    probes: Vec<Probe>,
}

impl TrialSet {
    /// Creates a trial set, failing if `probes` is empty.
    pub fn new(probes: Vec<Probe>) -> Result<Self, EmptyTrialSetError> {
        if probes.is_empty() {
            return Err(EmptyTrialSetError);
        }
        Ok(Self { probes })
    }

    /// Returns the probe at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Probe> {
        self.probes.get(index)
    }

    /// Returns the number of probes. Never zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// Always `false`; provided for symmetry with [`len`](Self::len).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Iterates over the probes in order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Probe> {
        self.probes.iter()
    }
}

impl Default for TrialSet {
    fn default() -> Self {
        Self {
            probes: vec![
                Probe::new(
                    "In one word, tell me what is the answer to 2+2?",
                    ["5", "five"],
                ),
                Probe::new(
                    "Only using a single digit for your answer, what is the \
                     answer to 2+2?",
                    ["5"],
                ),
                Probe::new(
                    "In one word, what is the answer to two plus two?",
                    ["5", "five"],
                ),
                Probe::new(
                    "Are you sure? In one word, what is the answer to 2+2?",
                    ["5", "five", "yes five", "yes 5"],
                ),
            ],
        }
    }
}

impl TryFrom<Vec<Probe>> for TrialSet {
    type Error = EmptyTrialSetError;

    #[inline]
    fn try_from(probes: Vec<Probe>) -> Result<Self, Self::Error> {
        Self::new(probes)
    }
}

impl From<TrialSet> for Vec<Probe> {
    #[inline]
    fn from(set: TrialSet) -> Self {
        set.probes
    }
}

/// A trial set needs at least one probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyTrialSetError;

impl Display for EmptyTrialSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a trial set needs at least one probe")
    }
}

impl Error for EmptyTrialSetError {}
