//! Classification metrics for model evaluation.
//!
//! Provides the confusion matrix, accuracy, support-weighted
//! precision/recall/F1, an sklearn-style text report and ROC/AUC for
//! binary probability scores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Element `[i][j]` counts samples with true class `i` predicted as `j`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Build from predictions and ground truth. Always at least 2x2.
    pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Self {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "Predictions and targets must have same length"
        );
        let n_classes = y_true
            .iter()
            .chain(y_pred.iter())
            .max()
            .map_or(2, |&m| (m + 1).max(2));

        let mut matrix = vec![vec![0; n_classes]; n_classes];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            matrix[t][p] += 1;
        }
        ConfusionMatrix { matrix }
    }

    pub fn n_classes(&self) -> usize {
        self.matrix.len()
    }

    pub fn get(&self, true_label: usize, predicted_label: usize) -> usize {
        self.matrix[true_label][predicted_label]
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.matrix[class][class]
    }

    pub fn false_positives(&self, class: usize) -> usize {
        (0..self.n_classes())
            .filter(|&i| i != class)
            .map(|i| self.matrix[i][class])
            .sum()
    }

    pub fn false_negatives(&self, class: usize) -> usize {
        (0..self.n_classes())
            .filter(|&j| j != class)
            .map(|j| self.matrix[class][j])
            .sum()
    }

    /// Number of true instances of `class`.
    pub fn support(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes()).map(|i| self.matrix[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Precision of one class; 0.0 when nothing was predicted as it.
    pub fn precision(&self, class: usize) -> f64 {
        let tp = self.true_positives(class) as f64;
        let fp = self.false_positives(class) as f64;
        if tp + fp > 0.0 {
            tp / (tp + fp)
        } else {
            0.0
        }
    }

    pub fn recall(&self, class: usize) -> f64 {
        let tp = self.true_positives(class) as f64;
        let fn_ = self.false_negatives(class) as f64;
        if tp + fn_ > 0.0 {
            tp / (tp + fn_)
        } else {
            0.0
        }
    }

    pub fn f1(&self, class: usize) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }

    /// Mean of `per_class` weighted by class support.
    fn weighted<F: Fn(usize) -> f64>(&self, per_class: F) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (0..self.n_classes())
            .map(|c| per_class(c) * self.support(c) as f64)
            .sum::<f64>()
            / total as f64
    }

    fn macro_avg<F: Fn(usize) -> f64>(&self, per_class: F) -> f64 {
        let n = self.n_classes();
        (0..n).map(per_class).sum::<f64>() / n as f64
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "")?;
        for j in 0..self.n_classes() {
            write!(f, "{:>8}", format!("pred {}", j))?;
        }
        writeln!(f)?;
        for i in 0..self.n_classes() {
            write!(f, "{:>10}", format!("true {}", i))?;
            for j in 0..self.n_classes() {
                write!(f, "{:>8}", self.matrix[i][j])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Scalar metrics reported for every classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    /// Support-weighted precision.
    pub precision: f64,
    /// Support-weighted recall.
    pub recall: f64,
    /// Support-weighted F1.
    pub f1: f64,
    pub confusion: ConfusionMatrix,
}

impl ClassificationMetrics {
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Self {
        let confusion = ConfusionMatrix::from_predictions(y_true, y_pred);
        ClassificationMetrics {
            accuracy: confusion.accuracy(),
            precision: confusion.weighted(|c| confusion.precision(c)),
            recall: confusion.weighted(|c| confusion.recall(c)),
            f1: confusion.weighted(|c| confusion.f1(c)),
            confusion,
        }
    }

    /// sklearn-style per-class report. `class_names` label the rows when given.
    pub fn report(&self, class_names: Option<&[String]>) -> String {
        let cm = &self.confusion;
        let label = |c: usize| -> String {
            class_names
                .and_then(|names| names.get(c).cloned())
                .unwrap_or_else(|| c.to_string())
        };
        let width = (0..cm.n_classes())
            .map(|c| label(c).len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        let mut out = format!(
            "{:>width$} {:>9} {:>9} {:>9} {:>9}\n\n",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            width = width
        );
        for c in 0..cm.n_classes() {
            out.push_str(&format!(
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
                label(c),
                cm.precision(c),
                cm.recall(c),
                cm.f1(c),
                cm.support(c),
                width = width
            ));
        }
        let total = cm.total();
        out.push_str(&format!(
            "\n{:>width$} {:>9} {:>9} {:>9.2} {:>9}\n",
            "accuracy",
            "",
            "",
            self.accuracy,
            total,
            width = width
        ));
        out.push_str(&format!(
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
            "macro avg",
            cm.macro_avg(|c| cm.precision(c)),
            cm.macro_avg(|c| cm.recall(c)),
            cm.macro_avg(|c| cm.f1(c)),
            total,
            width = width
        ));
        out.push_str(&format!(
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
            "weighted avg",
            self.precision,
            self.recall,
            self.f1,
            total,
            width = width
        ));
        out
    }
}

/// Receiver operating characteristic for a binary scorer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Decreasing; the first entry is `+inf` for the (0, 0) point.
    pub thresholds: Vec<f64>,
    pub auc: f64,
}

/// Compute the ROC curve of positive-class `scores` against `y_true` (0/1).
///
/// Collinear intermediate points are dropped; the area is unaffected.
pub fn roc_curve(y_true: &[usize], scores: &[f64]) -> Result<RocCurve, String> {
    if y_true.len() != scores.len() {
        return Err(format!(
            "{} labels but {} scores",
            y_true.len(),
            scores.len()
        ));
    }
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(format!("non-finite score {}", bad));
    }
    let n_pos = y_true.iter().filter(|&&y| y == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err("ROC needs both positive and negative samples".to_string());
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Cumulative counts at each distinct threshold.
    let mut fps = Vec::new();
    let mut tps = Vec::new();
    let mut thresholds = Vec::new();
    let (mut fp, mut tp) = (0usize, 0usize);
    for (k, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_group = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_group {
            fps.push(fp);
            tps.push(tp);
            thresholds.push(scores[i]);
        }
    }

    if fps.len() > 2 {
        let keep: Vec<usize> = (0..fps.len())
            .filter(|&k| {
                k == 0
                    || k == fps.len() - 1
                    || fps[k + 1] + fps[k - 1] != 2 * fps[k]
                    || tps[k + 1] + tps[k - 1] != 2 * tps[k]
            })
            .collect();
        fps = keep.iter().map(|&k| fps[k]).collect();
        tps = keep.iter().map(|&k| tps[k]).collect();
        thresholds = keep.iter().map(|&k| thresholds[k]).collect();
    }

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut ths = vec![f64::INFINITY];
    fpr.extend(fps.iter().map(|&f| f as f64 / n_neg as f64));
    tpr.extend(tps.iter().map(|&t| t as f64 / n_pos as f64));
    ths.extend(thresholds);

    let auc = auc(&fpr, &tpr);
    Ok(RocCurve {
        fpr,
        tpr,
        thresholds: ths,
        auc,
    })
}

/// Trapezoidal area under a curve with non-decreasing `x`.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum()
}
