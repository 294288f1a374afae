//! A single BOSS model
//!
//! One parameter combination, the breakpoints learned for it and the bag of
//! every training series. Classification is 1NN under the BOSS distance.
//!
//! Raw words are kept after building (unless the model is built clean) so
//! that shorter word lengths can be derived without re-transforming: see
//! [`BossIndividual::derive_shortened`].

use boss_core::{Dataset, Error, ExecutionEngine, Result};
use boss_sfa::{leave_one_out, nearest_neighbour, shorten, Bag, Breakpoints, SfaParams, SfaTransform, Word};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A built BOSS model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossIndividual {
    params: SfaParams,
    numerosity_reduction: bool,
    breakpoints: Breakpoints,
    bags: Vec<Bag>,
    #[serde(skip)]
    words: Option<Vec<Vec<Word>>>,
    accuracy: Option<f64>,
    weight: f64,
    subsample: Option<Vec<usize>>,
}

impl BossIndividual {
    /// Learn breakpoints on `data` (channel 0) and bag every instance
    ///
    /// Instances are transformed on `engine`, one task each.
    pub fn fit<E: ExecutionEngine>(
        params: SfaParams,
        data: &Dataset,
        clean_after_build: bool,
        engine: &E,
    ) -> Result<Self> {
        params.validate()?;
        let n = data.num_instances();
        let sfa = SfaTransform::fit(params, (0..n).map(|i| data.series(i, 0)))?;

        let words = engine
            .execute_batch(n, |i| sfa.words(data.series(i, 0)))
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        let bags = words
            .iter()
            .zip(data.labels())
            .map(|(w, &label)| Bag::from_words(w, true).with_label(Some(label)))
            .collect();

        trace!(%params, instances = n, "built individual");

        Ok(Self {
            params,
            numerosity_reduction: true,
            breakpoints: sfa.into_breakpoints(),
            bags,
            words: (!clean_after_build).then_some(words),
            accuracy: None,
            weight: 1.0,
            subsample: None,
        })
    }

    pub fn params(&self) -> &SfaParams {
        &self.params
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn bags(&self) -> &[Bag] {
        &self.bags
    }

    /// Number of training series the model was built on
    pub fn num_train(&self) -> usize {
        self.bags.len()
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    pub fn set_accuracy(&mut self, accuracy: f64) {
        self.accuracy = Some(accuracy);
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Indices into the channel's training set this model was built on
    pub fn subsample(&self) -> Option<&[usize]> {
        self.subsample.as_deref()
    }

    pub fn set_subsample(&mut self, indices: Vec<usize>) {
        self.subsample = Some(indices);
    }

    /// Position of training instance `i` among this model's bags, if it
    /// was part of the training data
    pub fn train_position(&self, i: usize) -> Option<usize> {
        match &self.subsample {
            None => (i < self.bags.len()).then_some(i),
            Some(indices) => indices.iter().position(|&s| s == i),
        }
    }

    /// Drop the raw words, keeping only what prediction needs
    pub fn clean(&mut self) {
        self.words = None;
    }

    pub fn is_clean(&self) -> bool {
        self.words.is_none()
    }

    /// Label of the nearest training bag to `series`
    pub fn classify(&self, series: &[f64]) -> Result<usize> {
        let bag = self.transform()?.bag(series, self.numerosity_reduction)?;
        self.nearest_label(&bag)
    }

    /// Leave-one-out label of training bag `i`
    pub fn classify_train(&self, i: usize) -> Result<usize> {
        leave_one_out(i, &self.bags)
            .and_then(|nn| nn.label)
            .ok_or(Error::InsufficientData {
                expected: 2,
                actual: self.bags.len(),
            })
    }

    fn nearest_label(&self, bag: &Bag) -> Result<usize> {
        nearest_neighbour(bag, &self.bags)
            .and_then(|nn| nn.label)
            .ok_or_else(|| Error::InvalidInput("model has no labelled training bags".to_string()))
    }

    fn transform(&self) -> Result<SfaTransform> {
        SfaTransform::from_breakpoints(self.params, &self.breakpoints)
    }

    /// View of this model at a shorter word length
    ///
    /// Bags are rebuilt from the retained raw words; breakpoints are shared.
    pub fn derive_shortened(&self, word_length: usize) -> Result<DerivedModel<'_>> {
        let words = self.words.as_ref().ok_or_else(|| {
            Error::InvalidInput("cannot shorten a cleaned model, raw words were dropped".to_string())
        })?;
        if word_length > self.params.word_length {
            return Err(Error::InvalidParameter(format!(
                "cannot increase word length, current {}, requested {word_length}",
                self.params.word_length
            )));
        }

        let bags = words
            .iter()
            .zip(&self.bags)
            .map(|(w, parent)| {
                shorten(w, word_length, self.numerosity_reduction).map(|b| b.with_label(parent.label()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DerivedModel {
            parent: self,
            params: self.params.with_word_length(word_length),
            bags,
        })
    }

    /// Estimated heap footprint in bytes
    pub fn footprint_bytes(&self) -> usize {
        let bags: usize = self.bags.iter().map(Bag::footprint_bytes).sum();
        let words = self
            .words
            .as_ref()
            .map_or(0, |w| w.iter().map(|s| s.len() * std::mem::size_of::<Word>()).sum());
        let subsample = self
            .subsample
            .as_ref()
            .map_or(0, |s| s.len() * std::mem::size_of::<usize>());
        std::mem::size_of::<Self>() + self.breakpoints.footprint_bytes() + bags + words + subsample
    }
}

/// A shortened view over a parent model's raw words
///
/// Owns its rebuilt bags and borrows everything else from the parent.
#[derive(Debug)]
pub struct DerivedModel<'a> {
    parent: &'a BossIndividual,
    params: SfaParams,
    bags: Vec<Bag>,
}

impl DerivedModel<'_> {
    pub fn params(&self) -> &SfaParams {
        &self.params
    }

    pub fn bags(&self) -> &[Bag] {
        &self.bags
    }

    pub fn classify_train(&self, i: usize) -> Option<usize> {
        leave_one_out(i, &self.bags).and_then(|nn| nn.label)
    }

    /// Materialize into a standalone, cleaned model
    pub fn into_owned(self) -> Result<BossIndividual> {
        Ok(BossIndividual {
            params: self.params,
            numerosity_reduction: self.parent.numerosity_reduction,
            breakpoints: self.parent.breakpoints.truncated(self.params.word_length)?,
            bags: self.bags,
            words: None,
            accuracy: None,
            weight: 1.0,
            subsample: self.parent.subsample.clone(),
        })
    }
}
