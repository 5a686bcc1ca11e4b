use std::collections::BTreeSet;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::log_sum_exp;

/// Multinomial Naive Bayes over non-negative feature vectors.
///
/// Classes are kept in sorted label order; every probability vector returned
/// by this type is indexed the same way as [`MultinomialNb::classes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha: f64,
    fit_prior: bool,
    classes: Vec<String>,
    class_count: Array1<f64>,
    class_log_prior: Array1<f64>,
    /// `[n_classes, n_features]`
    feature_log_prob: Array2<f64>,
}

impl MultinomialNb {
    /// Creates an unfitted classifier with additive smoothing `alpha`.
    pub fn new(alpha: f64, fit_prior: bool) -> Result<Self, ClassifierError> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ClassifierError::ValidationError(format!(
                "Smoothing parameter alpha must be positive, got {}",
                alpha
            )));
        }
        Ok(Self {
            alpha,
            fit_prior,
            classes: Vec::new(),
            class_count: Array1::zeros(0),
            class_log_prior: Array1::zeros(0),
            feature_log_prob: Array2::zeros((0, 0)),
        })
    }

    /// Fits class priors and per-class feature log probabilities.
    ///
    /// `features` is `[n_samples, n_features]`, `labels` has one entry per row.
    pub fn fit(&mut self, features: &Array2<f64>, labels: &[impl AsRef<str>]) -> Result<(), ClassifierError> {
        let (n_samples, n_features) = features.dim();
        if n_samples == 0 {
            return Err(ClassifierError::ValidationError("Cannot fit on zero samples".into()));
        }
        if n_samples != labels.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Found {} feature rows but {} labels",
                n_samples,
                labels.len()
            )));
        }
        if features.iter().any(|&x| x < 0.0 || !x.is_finite()) {
            return Err(ClassifierError::ValidationError(
                "Multinomial Naive Bayes requires non-negative finite features".into(),
            ));
        }

        let classes: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let n_classes = classes.len();
        let mut class_count = Array1::<f64>::zeros(n_classes);
        let mut feature_count = Array2::<f64>::zeros((n_classes, n_features));

        for (row, label) in features.axis_iter(Axis(0)).zip(labels) {
            let label: &str = label.as_ref();
            let class_idx = classes
                .binary_search_by(|c| c.as_str().cmp(label))
                .map_err(|_| ClassifierError::TrainingError(format!("Unknown label '{}'", label)))?;
            class_count[class_idx] += 1.0;
            let mut counts = feature_count.row_mut(class_idx);
            counts += &row;
        }

        let smoothed = feature_count + self.alpha;
        let totals = smoothed.sum_axis(Axis(1)).insert_axis(Axis(1));
        self.feature_log_prob = smoothed.mapv(f64::ln) - totals.mapv(f64::ln);

        self.class_log_prior = if self.fit_prior {
            class_count.mapv(|count| (count / n_samples as f64).ln())
        } else {
            Array1::from_elem(n_classes, -(n_classes as f64).ln())
        };

        self.class_count = class_count;
        self.classes = classes;
        log::debug!(
            "Naive Bayes fitted: {} classes, {} features, {} samples",
            n_classes,
            n_features,
            n_samples
        );
        Ok(())
    }

    /// Joint log likelihood of one feature vector for each class.
    fn joint_log_likelihood(&self, features: ArrayView1<f64>) -> Result<Array1<f64>, ClassifierError> {
        if self.classes.is_empty() {
            return Err(ClassifierError::PredictionError("Classifier is not fitted".into()));
        }
        if features.len() != self.n_features() {
            return Err(ClassifierError::PredictionError(format!(
                "Expected {} features, got {}",
                self.n_features(),
                features.len()
            )));
        }
        Ok(self.feature_log_prob.dot(&features) + &self.class_log_prior)
    }

    /// Log of [`Self::predict_proba`].
    pub fn predict_log_proba(&self, features: ArrayView1<f64>) -> Result<Array1<f64>, ClassifierError> {
        let jll = self.joint_log_likelihood(features)?;
        let norm = log_sum_exp(jll.view());
        Ok(jll - norm)
    }

    /// Class membership probabilities, summing to one.
    pub fn predict_proba(&self, features: ArrayView1<f64>) -> Result<Array1<f64>, ClassifierError> {
        Ok(self.predict_log_proba(features)?.mapv(f64::exp))
    }

    /// The most probable class; ties resolve to the first class in sorted order.
    pub fn predict(&self, features: ArrayView1<f64>) -> Result<&str, ClassifierError> {
        let jll = self.joint_log_likelihood(features)?;
        let best = Self::argmax(jll.view());
        Ok(&self.classes[best])
    }

    pub(crate) fn argmax(values: ArrayView1<f64>) -> usize {
        let mut best = 0;
        for (idx, &value) in values.iter().enumerate() {
            if value > values[best] {
                best = idx;
            }
        }
        best
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_count(&self) -> &Array1<f64> {
        &self.class_count
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Checks that the fitted parameter shapes agree with each other.
    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        let n_classes = self.classes.len();
        if n_classes == 0 {
            return Err(ClassifierError::ModelError("Classifier has no classes".into()));
        }
        if self.class_log_prior.len() != n_classes
            || self.class_count.len() != n_classes
            || self.feature_log_prob.nrows() != n_classes
        {
            return Err(ClassifierError::ModelError(format!(
                "Parameter shapes do not match the {} known classes",
                n_classes
            )));
        }
        if self.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ClassifierError::ModelError("Class labels must be sorted and unique".into()));
        }
        Ok(())
    }
}
