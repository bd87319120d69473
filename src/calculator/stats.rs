//! Descriptive statistics: `mean(1, 2, 3)`, `median 4 5 6`, ...

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::capability::{DescriptiveStatistics, ProviderError};
use super::format;
use super::outcome::{CalcError, Value};

lazy_static! {
    static ref STAT_CALL: Regex =
        Regex::new(r"^(mean|median|mode|stdev|std|variance|avg)\s*\(?([^)]*)\)?").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[\s,;]+").unwrap();
}

/// Sample statistics computed in `f64`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleStatistics;

fn require_len(data: &[f64], min: usize, what: &str) -> Result<(), ProviderError> {
    if data.len() < min {
        return Err(ProviderError::Domain(format!(
            "{what} requires at least {min} data point{}",
            if min == 1 { "" } else { "s" }
        )));
    }
    Ok(())
}

impl DescriptiveStatistics for SampleStatistics {
    fn mean(&self, data: &[f64]) -> Result<f64, ProviderError> {
        require_len(data, 1, "Mean")?;
        Ok(data.iter().sum::<f64>() / data.len() as f64)
    }

    fn median(&self, data: &[f64]) -> Result<f64, ProviderError> {
        require_len(data, 1, "Median")?;
        let mut sorted = data.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        Ok(if sorted.len() % 2 == 1 {
            sorted[mid]
        } else {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        })
    }

    fn mode(&self, data: &[f64]) -> Result<f64, ProviderError> {
        require_len(data, 1, "Mode")?;
        let mut counts: Vec<(f64, usize)> = Vec::new();
        for &x in data {
            match counts.iter_mut().find(|(v, _)| *v == x) {
                Some((_, n)) => *n += 1,
                None => counts.push((x, 1)),
            }
        }

        let best = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
        let mut winners = counts.iter().filter(|(_, n)| *n == best);
        match (winners.next(), winners.next()) {
            (Some((value, _)), None) => Ok(*value),
            _ => Err(ProviderError::Domain("no unique mode".into())),
        }
    }

    fn stdev(&self, data: &[f64]) -> Result<f64, ProviderError> {
        Ok(self.variance(data)?.sqrt())
    }

    fn variance(&self, data: &[f64]) -> Result<f64, ProviderError> {
        require_len(data, 2, "Variance")?;
        let mean = self.mean(data)?;
        let squares: f64 = data.iter().map(|x| (x - mean).powi(2)).sum();
        Ok(squares / (data.len() - 1) as f64)
    }
}

/// Split the data part of a statistics query into numbers.
fn parse_data(data: &str) -> Result<Vec<f64>, CalcError> {
    SEPARATORS
        .split(data.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| CalcError::parse("Invalid data for statistics (non-numeric)"))
        })
        .collect()
}

/// Evaluate a statistics query with the given provider.
pub fn evaluate(text: &str, stats: &dyn DescriptiveStatistics) -> Result<Value, CalcError> {
    let lower = text.trim().to_lowercase();
    debug!("Stats handler received: '{}'", lower);

    let caps = STAT_CALL.captures(&lower).ok_or_else(|| {
        CalcError::Unrecognized("Statistical function not recognized".into())
    })?;
    let func = &caps[1];
    let data = parse_data(&caps[2])?;

    if data.is_empty() {
        return Err(CalcError::InsufficientData("No data for statistics".into()));
    }

    let result = match func {
        "mean" | "avg" => stats.mean(&data),
        "median" => stats.median(&data),
        "mode" => Ok(stats.mode(&data).map_err(|_| CalcError::NoUniqueMode)?),
        "stdev" | "std" => {
            if data.len() < 2 {
                return Err(CalcError::InsufficientData(
                    "Stdev requires at least 2 data points".into(),
                ));
            }
            stats.stdev(&data)
        }
        "variance" => {
            if data.len() < 2 {
                return Err(CalcError::InsufficientData(
                    "Variance requires at least 2 data points".into(),
                ));
            }
            stats.variance(&data)
        }
        _ => {
            return Err(CalcError::Unrecognized(
                "Statistical function not recognized".into(),
            ));
        }
    };

    let value = result.map_err(|e| CalcError::failed("Stats", e.to_string()))?;
    Ok(Value::Number(format::statistic(value)?))
}
