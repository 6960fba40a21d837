//! CSV loader for the state-year crime panel.
//!
//! Parses the published castle-doctrine FBI panel layout: one row per
//! (sid, year) with crime rates, covariates, and a population weight.
//! Columns beyond the modeled schema are ignored. Missing numeric cells
//! (empty, `NA`, or `NaN`) are preserved as `None`; the loader never
//! coerces them to zero.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use cp_core::{Error, Result};
use serde::{Deserialize, Deserializer};

use crate::panel::Panel;
use crate::row::PanelRow;

/// Accept empty, `NA`, and `NaN` cells as missing; anything else must
/// parse as a finite float.
fn de_opt_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("NA") | Some("NaN") | Some("nan") => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid numeric cell '{s}': {e}"))),
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    sid: u32,
    year: i32,
    post: f64,
    #[serde(deserialize_with = "de_opt_f64", default)]
    homicide: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    robbery: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    larceny: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    assault: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    burglary: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    murder: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    unemployrt: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    poverty: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    l_exp_pubwelfare: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    l_police: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    l_income: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    blackm_15_24: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    whitem_15_24: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64", default)]
    popwt: Option<f64>,
}

impl RawRecord {
    fn into_row(self) -> Result<PanelRow> {
        let post = match self.post {
            p if p == 0.0 => false,
            p if p == 1.0 => true,
            p => {
                return Err(Error::Validation(format!(
                    "post must be 0 or 1, got {} (sid {}, year {})",
                    p, self.sid, self.year
                )));
            }
        };
        Ok(PanelRow {
            sid: self.sid,
            year: self.year,
            post,
            homicide: self.homicide,
            robbery: self.robbery,
            larceny: self.larceny,
            assault: self.assault,
            burglary: self.burglary,
            murder: self.murder,
            unemployrt: self.unemployrt,
            poverty: self.poverty,
            l_exp_pubwelfare: self.l_exp_pubwelfare,
            l_police: self.l_police,
            l_income: self.l_income,
            blackm_15_24: self.blackm_15_24,
            whitem_15_24: self.whitem_15_24,
            popwt: self.popwt,
        })
    }
}

/// Load a panel from any CSV reader (must have a header row).
pub fn from_csv_reader<R: Read>(reader: R) -> Result<Panel> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize::<RawRecord>() {
        rows.push(record?.into_row()?);
    }
    Panel::new(rows)
}

/// Load a panel from a CSV file on disk.
pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Panel> {
    from_csv_reader(File::open(path)?)
}
