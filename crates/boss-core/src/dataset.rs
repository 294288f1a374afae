//! Minimal labelled time series container
//!
//! Every instance carries one or more channels of identical length plus a
//! class label in `0..num_classes`. Validation happens at construction so
//! the classifiers downstream can index freely.

use crate::{Error, Result};

/// A single (possibly multivariate) series
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    channels: Vec<Vec<f64>>,
    label: Option<usize>,
}

impl Instance {
    /// Create a multivariate instance
    pub fn new(channels: Vec<Vec<f64>>, label: Option<usize>) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::InvalidInput("instance has no channels".to_string()));
        }
        let length = channels[0].len();
        if length == 0 {
            return Err(Error::empty_input("instance"));
        }
        for (c, channel) in channels.iter().enumerate() {
            if channel.len() != length {
                return Err(Error::size_mismatch(length, channel.len(), &format!("channel {c}")));
            }
            if channel.iter().any(|v| !v.is_finite()) {
                return Err(Error::non_finite(&format!("channel {c}")));
            }
        }
        Ok(Self { channels, label })
    }

    /// Create a univariate instance
    pub fn univariate(series: Vec<f64>, label: Option<usize>) -> Result<Self> {
        Self::new(vec![series], label)
    }

    /// Values of one channel
    pub fn channel(&self, c: usize) -> &[f64] {
        &self.channels[c]
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn series_length(&self) -> usize {
        self.channels[0].len()
    }

    pub fn label(&self) -> Option<usize> {
        self.label
    }

    /// Split into one single-channel instance per channel
    pub fn split_channels(&self) -> Vec<Instance> {
        self.channels
            .iter()
            .map(|c| Instance {
                channels: vec![c.clone()],
                label: self.label,
            })
            .collect()
    }
}

/// A labelled collection of instances sharing channel count and length
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    instances: Vec<Instance>,
    labels: Vec<usize>,
    num_classes: usize,
}

impl Dataset {
    /// Build a dataset from instances and their labels
    pub fn new(instances: Vec<Instance>, labels: Vec<usize>) -> Result<Self> {
        if instances.len() != labels.len() {
            return Err(Error::size_mismatch(instances.len(), labels.len(), "labels"));
        }
        if instances.is_empty() {
            return Err(Error::empty_input("dataset"));
        }

        let channels = instances[0].num_channels();
        let length = instances[0].series_length();
        for (i, inst) in instances.iter().enumerate() {
            if inst.num_channels() != channels {
                return Err(Error::size_mismatch(
                    channels,
                    inst.num_channels(),
                    &format!("channel count of instance {i}"),
                ));
            }
            if inst.series_length() != length {
                return Err(Error::size_mismatch(
                    length,
                    inst.series_length(),
                    &format!("channel length of instance {i}"),
                ));
            }
        }

        let num_classes = labels.iter().max().map_or(0, |&m| m + 1);
        let instances = instances
            .into_iter()
            .zip(&labels)
            .map(|(mut inst, &label)| {
                inst.label = Some(label);
                inst
            })
            .collect();

        Ok(Self {
            name: "dataset".to_string(),
            instances,
            labels,
            num_classes,
        })
    }

    /// Univariate dataset from raw series
    pub fn univariate(series: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<Self> {
        let instances = series
            .into_iter()
            .map(|s| Instance::univariate(s, None))
            .collect::<Result<Vec<_>>>()?;
        Self::new(instances, labels)
    }

    /// Multivariate dataset, `series[i][c]` is channel `c` of instance `i`
    pub fn multivariate(series: Vec<Vec<Vec<f64>>>, labels: Vec<usize>) -> Result<Self> {
        let instances = series
            .into_iter()
            .map(|channels| Instance::new(channels, None))
            .collect::<Result<Vec<_>>>()?;
        Self::new(instances, labels)
    }

    /// Univariate dataset from a row-major table with the class in `class_index`
    ///
    /// The class column must be the last column and hold non-negative
    /// integral values.
    pub fn from_rows(rows: Vec<Vec<f64>>, class_index: usize) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if width < 2 {
            return Err(Error::InvalidInput(
                "rows need at least one value column and a class column".to_string(),
            ));
        }
        if class_index != width - 1 {
            return Err(Error::InvalidInput(format!(
                "class attribute must be the last column ({}), found at {class_index}",
                width - 1
            )));
        }

        let mut series = Vec::with_capacity(rows.len());
        let mut labels = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(Error::size_mismatch(width, row.len(), &format!("row {i}")));
            }
            let class = row.pop().unwrap_or(f64::NAN);
            if !class.is_finite() || class < 0.0 || class.fract() != 0.0 {
                return Err(Error::InvalidInput(format!(
                    "row {i} has class value {class}, expected a non-negative integer"
                )));
            }
            labels.push(class as usize);
            series.push(row);
        }

        Self::univariate(series, labels)
    }

    /// Attach a name used to identify the dataset (e.g. for checkpoints)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare more classes than the labels present reveal
    pub fn with_num_classes(mut self, num_classes: usize) -> Result<Self> {
        if num_classes < self.num_classes {
            return Err(Error::InvalidParameter(format!(
                "num_classes {num_classes} is smaller than the largest label + 1 ({})",
                self.num_classes
            )));
        }
        self.num_classes = num_classes;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    pub fn num_channels(&self) -> usize {
        self.instances[0].num_channels()
    }

    pub fn is_multivariate(&self) -> bool {
        self.num_channels() > 1
    }

    pub fn series_length(&self) -> usize {
        self.instances[0].series_length()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, i: usize) -> &Instance {
        &self.instances[i]
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn label(&self, i: usize) -> usize {
        self.labels[i]
    }

    /// Values of channel `c` of instance `i`
    pub fn series(&self, i: usize, c: usize) -> &[f64] {
        self.instances[i].channel(c)
    }

    /// Number of instances per class
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }

    /// Single-channel dataset holding channel `c` of every instance
    pub fn channel(&self, c: usize) -> Result<Dataset> {
        if c >= self.num_channels() {
            return Err(Error::InvalidParameter(format!(
                "channel {c} out of range for {} channels",
                self.num_channels()
            )));
        }
        Ok(Dataset {
            name: self.name.clone(),
            instances: self
                .instances
                .iter()
                .map(|inst| Instance {
                    channels: vec![inst.channels[c].clone()],
                    label: inst.label,
                })
                .collect(),
            labels: self.labels.clone(),
            num_classes: self.num_classes,
        })
    }

    /// Split into one single-channel dataset per channel
    pub fn split_channels(&self) -> Result<Vec<Dataset>> {
        (0..self.num_channels()).map(|c| self.channel(c)).collect()
    }

    /// Dataset restricted to `indices` (in the given order)
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            name: self.name.clone(),
            instances: indices.iter().map(|&i| self.instances[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            num_classes: self.num_classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_univariate_dataset() {
        let ds = Dataset::univariate(
            vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0], vec![0.0, 0.0, 1.0]],
            vec![0, 1, 1],
        )
        .unwrap();

        assert_eq!(ds.num_instances(), 3);
        assert_eq!(ds.num_channels(), 1);
        assert_eq!(ds.series_length(), 3);
        assert_eq!(ds.num_classes(), 2);
        assert_eq!(ds.class_counts(), vec![1, 2]);
        assert_eq!(ds.instance(1).label(), Some(1));
        assert!(!ds.is_multivariate());
    }

    #[test]
    fn test_channel_length_mismatch_rejected() {
        let err = Dataset::multivariate(
            vec![
                vec![vec![1.0, 2.0], vec![1.0, 2.0]],
                vec![vec![1.0, 2.0], vec![1.0]],
            ],
            vec![0, 1],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = Dataset::univariate(vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]], vec![0, 1])
            .unwrap_err();
        assert!(err.to_string().contains("channel length"));
    }

    #[test]
    fn test_from_rows_requires_trailing_class() {
        let rows = vec![vec![1.0, 2.0, 0.0], vec![2.0, 1.0, 1.0]];
        let ds = Dataset::from_rows(rows.clone(), 2).unwrap();
        assert_eq!(ds.labels(), &[0, 1]);
        assert_eq!(ds.series(1, 0), &[2.0, 1.0]);

        let err = Dataset::from_rows(rows, 0).unwrap_err();
        assert!(err.to_string().contains("last column"));

        let err = Dataset::from_rows(vec![vec![1.0, 2.0, 0.5]], 2).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let err = Dataset::univariate(vec![vec![1.0, f64::NAN]], vec![0]).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[test]
    fn test_split_and_subset() {
        let ds = Dataset::multivariate(
            vec![
                vec![vec![1.0, 2.0], vec![10.0, 20.0]],
                vec![vec![3.0, 4.0], vec![30.0, 40.0]],
                vec![vec![5.0, 6.0], vec![50.0, 60.0]],
            ],
            vec![0, 1, 0],
        )
        .unwrap()
        .with_name("toy");

        let channels = ds.split_channels().unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[1].series(2, 0), &[50.0, 60.0]);
        assert_eq!(channels[1].labels(), ds.labels());
        assert_eq!(channels[0].name(), "toy");

        let sub = ds.subset(&[2, 0]);
        assert_eq!(sub.labels(), &[0, 0]);
        assert_eq!(sub.series(0, 1), &[50.0, 60.0]);
        assert_eq!(sub.num_classes(), 2);

        assert!(ds.channel(2).is_err());
        assert_eq!(ds.instance(0).split_channels()[1].channel(0), &[10.0, 20.0]);
    }

    #[test]
    fn test_with_num_classes() {
        let ds = Dataset::univariate(vec![vec![1.0], vec![2.0]], vec![0, 1]).unwrap();
        let ds = ds.with_num_classes(4).unwrap();
        assert_eq!(ds.class_counts(), vec![1, 1, 0, 0]);
        assert!(ds.with_num_classes(1).is_err());
    }
}
