use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Un marqueur décodé : position en échantillons et code 8 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Sample index, relative to the origin of the owning stream.
    pub sample: usize,
    /// Marker value, one bit per digital line.
    pub code: u8,
}

impl Event {
    /// Crée un événement.
    #[must_use]
    pub fn new(sample: usize, code: u8) -> Self {
        Self { sample, code }
    }
}

/// Ordered collection of markers.
///
/// Every operation that filters or re-aligns returns a fresh stream; the
/// source is never touched. Samples are assumed non-decreasing but this is
/// not checked.
///
/// # Example
/// ```
/// use ec_core::events::{Event, EventStream};
/// let stream = EventStream::from(vec![Event::new(10, 13), Event::new(40, 1)]);
/// assert_eq!(stream.samples_for_code(1), vec![40]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStream {
    events: Vec<Event>,
}

impl From<Vec<Event>> for EventStream {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl EventStream {
    /// Empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copie une sous-liste d'événements, optionnellement ramenée à zéro
    /// sur le premier élément.
    ///
    /// # Example
    /// ```
    /// use ec_core::events::{Event, EventStream};
    /// let s = EventStream::from_slice(&[Event::new(100, 13), Event::new(130, 1)], true);
    /// assert_eq!(s.get(0).map(|e| e.sample), Some(0));
    /// assert_eq!(s.get(1).map(|e| e.sample), Some(30));
    /// ```
    #[must_use]
    pub fn from_slice(events: &[Event], rezero: bool) -> Self {
        let mut events = events.to_vec();
        if rezero {
            if let Some(zero) = events.first().map(|e| e.sample) {
                for e in &mut events {
                    e.sample = e.sample.saturating_sub(zero);
                }
            }
        }
        Self { events }
    }

    /// Parse the persisted text form: one `sample code` pair per line,
    /// separated by any whitespace. Blank lines are skipped.
    ///
    /// # Errors
    /// Returns [`CoreError::EventParse`] on a malformed line or a code that
    /// does not fit in 8 bits.
    pub fn from_text(text: &str) -> Result<Self, CoreError> {
        let mut events = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            events.push(parse_line(line).map_err(|reason| CoreError::EventParse {
                line: i + 1,
                reason,
            })?);
        }
        Ok(Self { events })
    }

    /// Serialise to the tab-separated text form.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.events.len() * 10);
        for e in &self.events {
            let _ = writeln!(out, "{}\t{}", e.sample, e.code);
        }
        out
    }

    /// Charge un fichier d'événements texte.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        let stream = Self::from_text(&text)
            .with_context(|| format!("Fichier d'événements {}", path.display()))?;
        log::debug!("{} événements lus depuis {}", stream.len(), path.display());
        Ok(stream)
    }

    /// Écrit le flux au format texte.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text())
            .with_context(|| format!("Impossible d'écrire {}", path.display()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// All events, in insertion order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Marker values in order.
    #[must_use]
    pub fn codes(&self) -> Vec<u8> {
        self.events.iter().map(|e| e.code).collect()
    }

    /// Samples of every event carrying `code`.
    #[must_use]
    pub fn samples_for_code(&self, code: u8) -> Vec<usize> {
        self.events
            .iter()
            .filter(|e| e.code == code)
            .map(|e| e.sample)
            .collect()
    }

    /// Sample of the first event carrying `code`.
    #[must_use]
    pub fn first_sample_for_code(&self, code: u8) -> Option<usize> {
        self.events.iter().find(|e| e.code == code).map(|e| e.sample)
    }

    /// Events with `start <= sample < stop`.
    #[must_use]
    pub fn events_between_samples(&self, start: usize, stop: usize) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| (start..stop).contains(&e.sample))
            .copied()
            .collect()
    }

    /// Events between a start code and a stop code.
    ///
    /// Inclusion is a toggle: `start_code` switches it on (and is kept),
    /// `stop_code` switches it off (and is dropped). A later `start_code`
    /// switches it on again.
    ///
    /// # Example
    /// ```
    /// use ec_core::events::{Event, EventStream};
    /// let s = EventStream::from(vec![
    ///     Event::new(0, 11), Event::new(5, 13), Event::new(9, 1), Event::new(20, 14), Event::new(30, 2),
    /// ]);
    /// let phase = s.events_between_codes(13, 14);
    /// assert_eq!(phase, vec![Event::new(5, 13), Event::new(9, 1)]);
    /// ```
    #[must_use]
    pub fn events_between_codes(&self, start_code: u8, stop_code: u8) -> Vec<Event> {
        let mut inside = false;
        let mut out = Vec::new();
        for e in &self.events {
            if e.code == start_code {
                inside = true;
            } else if e.code == stop_code {
                inside = false;
            }
            if inside {
                out.push(*e);
            }
        }
        out
    }

    /// Copy of the stream without the element at `index`.
    ///
    /// # Errors
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= len`.
    pub fn without_index(&self, index: usize) -> Result<Self, CoreError> {
        if index >= self.events.len() {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: self.events.len(),
            });
        }
        let mut events = self.events.clone();
        events.remove(index);
        Ok(Self { events })
    }

    /// Copy of the stream starting at `index`. Past the end yields an empty stream.
    #[must_use]
    pub fn from_index(&self, index: usize) -> Self {
        Self {
            events: self.events.get(index..).map(<[Event]>::to_vec).unwrap_or_default(),
        }
    }

    /// Ré-échantillonne les positions : `round(sample / factor)`, ties-to-even.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `factor` is not strictly positive and finite.
    pub fn downsampled(&self, factor: f64) -> Result<Self, CoreError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(CoreError::Config(format!(
                "facteur de sous-échantillonnage invalide : {factor}"
            )));
        }
        let events = self
            .events
            .iter()
            .map(|e| Event {
                sample: (e.sample as f64 / factor).round_ties_even() as usize,
                code: e.code,
            })
            .collect();
        Ok(Self { events })
    }
}

impl<'a> IntoIterator for &'a EventStream {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn parse_line(line: &str) -> std::result::Result<Event, String> {
    let mut tokens = line.split_whitespace();
    let sample = tokens
        .next()
        .ok_or("position manquante")?
        .parse::<usize>()
        .map_err(|e| format!("position : {e}"))?;
    let code = tokens
        .next()
        .ok_or("code manquant")?
        .parse::<u8>()
        .map_err(|e| format!("code : {e}"))?;
    if tokens.next().is_some() {
        return Err("colonnes en trop".into());
    }
    Ok(Event { sample, code })
}
