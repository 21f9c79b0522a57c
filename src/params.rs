use std::{collections::HashMap, fmt, io::BufRead, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;
use regex::Regex;

use crate::calculator::{Calculator, SimpleCalculator};

const HEADER: &str = "unit_length\tparameter\tmaximum\tintercept\trepeat_count_coef";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParamName {
    Pi,
    Tau,
    Del,
    Ins,
}

impl ParamName {
    pub const ALL: [ParamName; 4] = [Self::Pi, Self::Tau, Self::Del, Self::Ins];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pi" => Some(Self::Pi),
            "tau" => Some(Self::Tau),
            "del" => Some(Self::Del),
            "ins" => Some(Self::Ins),
            _ => None,
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pi => "PI",
            Self::Tau => "TAU",
            Self::Del => "DEL",
            Self::Ins => "INS",
        };
        write!(f, "{}", s)
    }
}

/// Regression curve for one model parameter as a function of repeat count
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StrModelParameter {
    maximum: f64,
    intercept: f64,
    repeat_count_coef: f64,
}

impl StrModelParameter {
    pub fn new(maximum: f64, intercept: f64, repeat_count_coef: f64) -> anyhow::Result<Self> {
        if maximum.is_nan() || maximum <= 0.0 || maximum > 1.0 {
            Err(anyhow!("invalid maximum value: {}", maximum))
        } else if !intercept.is_finite() {
            Err(anyhow!("invalid intercept value: {}", intercept))
        } else if !repeat_count_coef.is_finite() {
            Err(anyhow!("invalid repeat count coef value: {}", repeat_count_coef))
        } else {
            Ok(Self {
                maximum,
                intercept,
                repeat_count_coef,
            })
        }
    }

    /// Logistic curve bounded above by `maximum`
    pub fn value(&self, repeat_count: usize) -> f64 {
        let x = self.intercept + self.repeat_count_coef * repeat_count as f64;
        self.maximum / (1.0 + (-x).exp())
    }
}

/// Read the model parameter file, returning the calculators indexed by unit length.
/// Entry 0 is always the null calculator.
pub fn read_parameter_file<S: AsRef<Path>>(file: S) -> anyhow::Result<Vec<Calculator>> {
    let file = file.as_ref();
    let rdr = CompressIo::new()
        .path(file)
        .bufreader()
        .with_context(|| format!("Could not open STR model file {}", file.display()))?;
    debug!("Reading in STR model parameters from {}", file.display());
    let calc = parse_parameters(rdr, &file.display().to_string())?;
    info!(
        "STR model read in from {} for unit lengths up to {}",
        file.display(),
        calc.len() - 1
    );
    Ok(calc)
}

pub fn parse_parameters<R: BufRead>(mut rdr: R, name: &str) -> anyhow::Result<Vec<Calculator>> {
    let file_err = |msg: String| anyhow!("Error reading STR model file {}: {}", name, msg);
    let line_err = |line: usize, s: &str, msg: String| {
        anyhow!(
            "Error reading STR model file {} at line {} ({}): {}",
            name,
            line,
            s.trim_end(),
            msg
        )
    };

    let re_unit = Regex::new(r"^(\d+)(\+)?$").unwrap();
    let mut parameters: HashMap<(usize, ParamName), StrModelParameter> = HashMap::new();
    let mut max_found = 0;
    let mut max_declared: Option<usize> = None;
    let mut buf = String::new();
    let mut line = 0;
    loop {
        buf.clear();
        if rdr
            .read_line(&mut buf)
            .with_context(|| format!("Error reading from STR model file {}", name))?
            == 0
        {
            break;
        }
        line += 1;
        let s = buf.trim_end_matches(['\n', '\r']);
        let t = s.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        let mut fields: Vec<_> = s.split('\t').collect();
        // Trailing empty fields are ignored
        while fields.len() > 1 && fields.last() == Some(&"") {
            fields.pop();
        }
        if !fields[0].starts_with(|c: char| c.is_ascii_digit()) {
            if !t.eq_ignore_ascii_case(HEADER) {
                return Err(line_err(line, s, "unexpected header content".to_string()));
            }
            continue;
        }
        if fields.len() != 5 {
            return Err(line_err(
                line,
                s,
                format!("we expect 5 values per line but we found {}", fields.len()),
            ));
        }
        let cap = re_unit.captures(fields[0].trim()).ok_or_else(|| {
            line_err(
                line,
                s,
                format!("unit_length values must be a positive integer: {}", fields[0].trim()),
            )
        })?;
        let unit_length = cap[1]
            .parse::<usize>()
            .map_err(|e| line_err(line, s, format!("invalid unit_length: {}", e)))?;
        if unit_length == 0 {
            return Err(line_err(line, s, "unit_length must be greater than 0".to_string()));
        }
        if cap.get(2).is_some() {
            match max_declared {
                None => max_declared = Some(unit_length),
                Some(x) if x != unit_length => {
                    return Err(line_err(
                        line,
                        s,
                        format!(
                            "there is more than one maximum unit length declared: {} and {}",
                            x, unit_length
                        ),
                    ));
                }
                _ => (),
            }
        }
        max_found = max_found.max(unit_length);

        let param = ParamName::from_str(fields[1].trim())
            .ok_or_else(|| line_err(line, s, format!("unknown parameter: {}", fields[1].trim())))?;
        let mut values = [0.0; 3];
        for (v, f) in values.iter_mut().zip(fields[2..].iter()) {
            *v = f
                .trim()
                .parse::<f64>()
                .map_err(|_| line_err(line, s, format!("invalid double string: {}", f.trim())))?;
        }
        let p = StrModelParameter::new(values[0], values[1], values[2])
            .map_err(|e| line_err(line, s, e.to_string()))?;
        let key = (unit_length, param);
        if parameters.insert(key, p).is_some() {
            return Err(line_err(line, s, format!("repeated entry: ({}, {})", unit_length, param)));
        }
        trace!("Parameter {} for unit length {}: {:?}", param, unit_length, p);
    }

    if max_found == 0 {
        return Err(file_err("no entries found in file".to_string()));
    }
    if let Some(x) = max_declared
        && x != max_found
    {
        return Err(file_err(format!(
            "the maximum unit length found ({}) is not the one declared with a '+' ({})",
            max_found, x
        )));
    }

    let mut calc = Vec::with_capacity(max_found + 1);
    calc.push(Calculator::Null);
    for unit_length in 1..=max_found {
        let mut get = |p: ParamName| {
            parameters
                .remove(&(unit_length, p))
                .ok_or_else(|| file_err(format!("missing: ({}, {})", unit_length, p)))
        };
        calc.push(Calculator::Simple(SimpleCalculator::new(
            get(ParamName::Pi)?,
            get(ParamName::Tau)?,
            get(ParamName::Del)?,
            get(ParamName::Ins)?,
        )));
    }
    Ok(calc)
}
