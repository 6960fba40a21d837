//! Typed panel row and named-column accessors.
//!
//! The row schema is fixed (one observation = one state-year), but the
//! estimators stay outcome-agnostic through the [`Outcome`] / [`Covariate`]
//! enums: the same DiD or regression code runs for homicide, murder,
//! robbery, larceny, or assault by switching a single enum value instead of
//! duplicating the computation per crime type.

use std::fmt;
use std::str::FromStr;

use cp_core::Error;
use serde::{Deserialize, Serialize};

/// Crime-rate outcome columns (rates per 100,000 population).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    /// Homicide rate.
    Homicide,
    /// Robbery rate.
    Robbery,
    /// Larceny rate.
    Larceny,
    /// Aggravated assault rate.
    Assault,
    /// Burglary rate.
    Burglary,
    /// Murder rate.
    Murder,
}

impl Outcome {
    /// All outcome columns, in dataset order.
    pub const ALL: [Outcome; 6] = [
        Outcome::Homicide,
        Outcome::Robbery,
        Outcome::Larceny,
        Outcome::Assault,
        Outcome::Burglary,
        Outcome::Murder,
    ];

    /// Column name in the source dataset.
    pub fn name(self) -> &'static str {
        match self {
            Outcome::Homicide => "homicide",
            Outcome::Robbery => "robbery",
            Outcome::Larceny => "larceny",
            Outcome::Assault => "assault",
            Outcome::Burglary => "burglary",
            Outcome::Murder => "murder",
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Outcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Outcome::ALL
            .into_iter()
            .find(|o| o.name() == s)
            .ok_or_else(|| Error::Validation(format!("unknown outcome column '{s}'")))
    }
}

/// Socioeconomic and demographic covariate columns. The `l_*` columns are
/// already log-transformed upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Covariate {
    /// Unemployment rate (`unemployrt`).
    Unemployment,
    /// Poverty rate (`poverty`).
    Poverty,
    /// Log public-welfare expenditure (`l_exp_pubwelfare`).
    LogPubWelfare,
    /// Log police presence (`l_police`).
    LogPolice,
    /// Log median income (`l_income`).
    LogIncome,
    /// Share of black males aged 15-24 (`blackm_15_24`).
    BlackMale1524,
    /// Share of white males aged 15-24 (`whitem_15_24`).
    WhiteMale1524,
}

impl Covariate {
    /// All covariate columns, in dataset order.
    pub const ALL: [Covariate; 7] = [
        Covariate::Unemployment,
        Covariate::Poverty,
        Covariate::LogPubWelfare,
        Covariate::LogPolice,
        Covariate::LogIncome,
        Covariate::BlackMale1524,
        Covariate::WhiteMale1524,
    ];

    /// Column name in the source dataset.
    pub fn name(self) -> &'static str {
        match self {
            Covariate::Unemployment => "unemployrt",
            Covariate::Poverty => "poverty",
            Covariate::LogPubWelfare => "l_exp_pubwelfare",
            Covariate::LogPolice => "l_police",
            Covariate::LogIncome => "l_income",
            Covariate::BlackMale1524 => "blackm_15_24",
            Covariate::WhiteMale1524 => "whitem_15_24",
        }
    }
}

impl Serialize for Covariate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for Covariate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Covariate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Covariate::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::Validation(format!("unknown covariate column '{s}'")))
    }
}

/// Any named numeric column of the panel, for column-generic consumers
/// such as the correlation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Column {
    /// Treatment phase indicator as 0/1.
    Post,
    /// A crime-rate outcome.
    Outcome(Outcome),
    /// A socioeconomic covariate.
    Covariate(Covariate),
    /// Population weight (`popwt`).
    PopWeight,
}

impl Column {
    /// Column name in the source dataset.
    pub fn name(self) -> &'static str {
        match self {
            Column::Post => "post",
            Column::Outcome(o) => o.name(),
            Column::Covariate(c) => c.name(),
            Column::PopWeight => "popwt",
        }
    }
}

impl Serialize for Column {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "post" => Ok(Column::Post),
            "popwt" => Ok(Column::PopWeight),
            _ => Outcome::from_str(s).map(Column::Outcome).or_else(|_| {
                Covariate::from_str(s)
                    .map(Column::Covariate)
                    .map_err(|_| Error::Validation(format!("unknown column '{s}'")))
            }),
        }
    }
}

/// One observation: a single state in a single calendar year.
///
/// Every numeric measure is an `Option<f64>`; a missing value in the source
/// data stays `None` through every aggregation instead of being coerced
/// to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    /// State identifier.
    pub sid: u32,
    /// Calendar year.
    pub year: i32,
    /// Treatment phase: `true` once the state's law is in effect for this
    /// year. A function of (state, year), set by the upstream data source.
    pub post: bool,

    /// Homicide rate per 100,000.
    pub homicide: Option<f64>,
    /// Robbery rate per 100,000.
    pub robbery: Option<f64>,
    /// Larceny rate per 100,000.
    pub larceny: Option<f64>,
    /// Aggravated assault rate per 100,000.
    pub assault: Option<f64>,
    /// Burglary rate per 100,000.
    pub burglary: Option<f64>,
    /// Murder rate per 100,000.
    pub murder: Option<f64>,

    /// Unemployment rate.
    pub unemployrt: Option<f64>,
    /// Poverty rate.
    pub poverty: Option<f64>,
    /// Log public-welfare expenditure.
    pub l_exp_pubwelfare: Option<f64>,
    /// Log police presence.
    pub l_police: Option<f64>,
    /// Log median income.
    pub l_income: Option<f64>,
    /// Share of black males aged 15-24.
    pub blackm_15_24: Option<f64>,
    /// Share of white males aged 15-24.
    pub whitem_15_24: Option<f64>,

    /// Population weight.
    pub popwt: Option<f64>,
}

impl PanelRow {
    /// A row with every measure missing. Fixture panels and programmatic
    /// callers fill in measures with [`PanelRow::with_outcome`] /
    /// [`PanelRow::with_covariate`].
    pub fn new(sid: u32, year: i32, post: bool) -> Self {
        Self {
            sid,
            year,
            post,
            homicide: None,
            robbery: None,
            larceny: None,
            assault: None,
            burglary: None,
            murder: None,
            unemployrt: None,
            poverty: None,
            l_exp_pubwelfare: None,
            l_police: None,
            l_income: None,
            blackm_15_24: None,
            whitem_15_24: None,
            popwt: None,
        }
    }

    /// Set an outcome column.
    pub fn with_outcome(mut self, outcome: Outcome, value: f64) -> Self {
        match outcome {
            Outcome::Homicide => self.homicide = Some(value),
            Outcome::Robbery => self.robbery = Some(value),
            Outcome::Larceny => self.larceny = Some(value),
            Outcome::Assault => self.assault = Some(value),
            Outcome::Burglary => self.burglary = Some(value),
            Outcome::Murder => self.murder = Some(value),
        }
        self
    }

    /// Set a covariate column.
    pub fn with_covariate(mut self, covariate: Covariate, value: f64) -> Self {
        match covariate {
            Covariate::Unemployment => self.unemployrt = Some(value),
            Covariate::Poverty => self.poverty = Some(value),
            Covariate::LogPubWelfare => self.l_exp_pubwelfare = Some(value),
            Covariate::LogPolice => self.l_police = Some(value),
            Covariate::LogIncome => self.l_income = Some(value),
            Covariate::BlackMale1524 => self.blackm_15_24 = Some(value),
            Covariate::WhiteMale1524 => self.whitem_15_24 = Some(value),
        }
        self
    }

    /// Value of an outcome column.
    pub fn outcome(&self, outcome: Outcome) -> Option<f64> {
        match outcome {
            Outcome::Homicide => self.homicide,
            Outcome::Robbery => self.robbery,
            Outcome::Larceny => self.larceny,
            Outcome::Assault => self.assault,
            Outcome::Burglary => self.burglary,
            Outcome::Murder => self.murder,
        }
    }

    /// Value of a covariate column.
    pub fn covariate(&self, covariate: Covariate) -> Option<f64> {
        match covariate {
            Covariate::Unemployment => self.unemployrt,
            Covariate::Poverty => self.poverty,
            Covariate::LogPubWelfare => self.l_exp_pubwelfare,
            Covariate::LogPolice => self.l_police,
            Covariate::LogIncome => self.l_income,
            Covariate::BlackMale1524 => self.blackm_15_24,
            Covariate::WhiteMale1524 => self.whitem_15_24,
        }
    }

    /// Value of any named numeric column. `post` is reported as 0.0/1.0.
    pub fn column(&self, column: Column) -> Option<f64> {
        match column {
            Column::Post => Some(if self.post { 1.0 } else { 0.0 }),
            Column::Outcome(o) => self.outcome(o),
            Column::Covariate(c) => self.covariate(c),
            Column::PopWeight => self.popwt,
        }
    }
}
