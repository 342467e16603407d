//! Parsed concentration samples grouped by timestamp.

use std::collections::HashMap;

use crate::config::Layer;

/// One PST record.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub elevation: Option<f64>,
    /// µg/m³
    pub concentration: f64,
    /// Decoded `20YY-MM-DD HH:00:00`; hour may be `24`.
    pub timestamp: String,
}

impl Sample {
    pub fn manhattan_from_origin(&self) -> f64 {
        self.x.abs() + self.y.abs()
    }
}

/// All samples sharing one timestamp, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFrame {
    pub timestamp: String,
    pub samples: Vec<Sample>,
}

/// Ordered map from timestamp to [`TimeFrame`].
///
/// Iteration follows the order in which each timestamp was first seen.
#[derive(Debug, Clone, Default)]
pub struct TimeFrames {
    frames: Vec<TimeFrame>,
    index: HashMap<String, usize>,
}

impl TimeFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `sample` to its timestamp's frame, creating the frame at the
    /// end of the order if the timestamp is new.
    pub fn push(&mut self, sample: Sample) {
        match self.index.get(&sample.timestamp) {
            Some(&i) => self.frames[i].samples.push(sample),
            None => {
                self.index
                    .insert(sample.timestamp.clone(), self.frames.len());
                self.frames.push(TimeFrame {
                    timestamp: sample.timestamp.clone(),
                    samples: vec![sample],
                });
            }
        }
    }

    pub fn contains(&self, timestamp: &str) -> bool {
        self.index.contains_key(timestamp)
    }

    pub fn get(&self, timestamp: &str) -> Option<&TimeFrame> {
        self.index.get(timestamp).map(|&i| &self.frames[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeFrame> {
        self.frames.iter()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.timestamp.as_str())
    }

    /// Number of distinct timestamps.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.frames.iter().map(|f| f.samples.len()).sum()
    }

    /// Restricts every frame to samples whose elevation exactly equals the
    /// layer center. Timestamps left without samples are kept, empty.
    pub fn filter_layer(&self, layer: &Layer) -> TimeFrames {
        let frames = self
            .frames
            .iter()
            .map(|f| TimeFrame {
                timestamp: f.timestamp.clone(),
                samples: f
                    .samples
                    .iter()
                    .filter(|s| layer.contains(s.elevation))
                    .cloned()
                    .collect(),
            })
            .collect();

        TimeFrames {
            frames,
            index: self.index.clone(),
        }
    }
}

impl<'a> IntoIterator for &'a TimeFrames {
    type Item = &'a TimeFrame;
    type IntoIter = std::slice::Iter<'a, TimeFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
pub(crate) fn sample(x: f64, y: f64, elevation: Option<f64>, concentration: f64, ts: &str) -> Sample {
    Sample {
        x,
        y,
        elevation,
        concentration,
        timestamp: ts.to_string(),
    }
}
