//! Builders for the demand parameters of water resource zones.
use super::parameters_mut;
use crate::errors::ModelJsonError;

use serde_json::{json, Value};

/// Number of demand saving levels, level 0 being no saving.
pub const DEMAND_SAVING_LEVELS: u32 = 5;

/// Where the demand of a zone is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemandSources<'a> {
    /// Table holding the baseline demand of each zone.
    pub baseline_table: &'a str,
    /// Column of the baseline table to read.
    pub baseline_column: &'a str,
    /// Table holding each zone's monthly demand profile.
    pub profile_table: &'a str,
    /// Demand saving, or `None` to disable it.
    pub saving: Option<DemandSaving<'a>>,
}

/// Where the demand saving factors of a zone are read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemandSaving<'a> {
    /// Table of monthly saving factors, indexed by `[level, zone]`.
    pub table: &'a str,
    /// Name of the parameter giving the current saving level.
    pub level_parameter: &'a str,
}

/// Adds the constant baseline demand parameter of zone
/// `wrz_name`, and returns the parameter's name.
pub fn add_baseline_demand_parameter(
    data: &mut Value,
    wrz_name: &str,
    table: &str,
    column: &str,
) -> Result<String, ModelJsonError> {
    insert(
        data,
        format!("{}_BL_demand", wrz_name),
        json!({
            "type": "constant",
            "table": table,
            "column": column,
            "index": wrz_name
        }),
    )
}

/// Adds the monthly demand profile parameter of zone
/// `wrz_name`, and returns the parameter's name.
pub fn add_monthly_demand_profile(
    data: &mut Value,
    wrz_name: &str,
    table: &str,
) -> Result<String, ModelJsonError> {
    insert(
        data,
        format!("{}_demand_profile", wrz_name),
        json!({
            "type": "monthlyprofile",
            "table": table,
            "index": wrz_name
        }),
    )
}

/// Adds the demand saving factor of zone `wrz_name`, selected among
/// [`DEMAND_SAVING_LEVELS`] levels by the parameter `level_param_name`,
/// and returns the parameter's name. Level 0 applies no saving.
pub fn add_demand_saving_parameter(
    data: &mut Value,
    wrz_name: &str,
    table: &str,
    level_param_name: &str,
) -> Result<String, ModelJsonError> {
    let levels = std::iter::once(json!({"type": "constant", "values": 1.0}))
        .chain((1..DEMAND_SAVING_LEVELS).map(|level| {
            json!({
                "type": "monthlyprofile",
                "table": table,
                "index": [level, wrz_name]
            })
        }))
        .collect::<Vec<_>>();
    insert(
        data,
        format!("{}_demand_saving", wrz_name),
        json!({
            "type": "indexedarray",
            "index_parameter": level_param_name,
            "params": levels
        }),
    )
}

/// Adds the demand of zone `wrz_name` as the product of its baseline
/// demand, its monthly profile and, if configured, its demand saving
/// factor. Returns the name of the demand parameter.
///
/// # Examples
/// ```
/// use hydrobin_model::model_json::{add_demand_parameters, DemandSaving, DemandSources};
/// use serde_json::json;
///
/// let mut data = json!({"parameters": {}});
/// let sources = DemandSources {
///     baseline_table: "baseline",
///     baseline_column: "2020",
///     profile_table: "profiles",
///     saving: Some(DemandSaving { table: "savings", level_parameter: "level" }),
/// };
///
/// let name = add_demand_parameters(&mut data, "north", &sources).unwrap();
///
/// assert_eq!(name, "north_demand");
/// assert_eq!(
///     data["parameters"]["north_demand"]["parameters"],
///     json!(["north_BL_demand", "north_demand_profile", "north_demand_saving"])
/// );
/// ```
pub fn add_demand_parameters(
    data: &mut Value,
    wrz_name: &str,
    sources: &DemandSources<'_>,
) -> Result<String, ModelJsonError> {
    let mut factors = vec![
        add_baseline_demand_parameter(
            data,
            wrz_name,
            sources.baseline_table,
            sources.baseline_column,
        )?,
        add_monthly_demand_profile(data, wrz_name, sources.profile_table)?,
    ];
    if let Some(saving) = sources.saving {
        factors.push(add_demand_saving_parameter(
            data,
            wrz_name,
            saving.table,
            saving.level_parameter,
        )?);
    }
    insert(
        data,
        format!("{}_demand", wrz_name),
        json!({
            "type": "aggregated",
            "agg_func": "product",
            "parameters": factors
        }),
    )
}

/// Adds the monthly control curve of saving `level` for `reservoir`,
/// and returns the parameter's name.
pub fn add_demand_saving_control_curve(
    data: &mut Value,
    reservoir: &str,
    url: &str,
    level: u32,
) -> Result<String, ModelJsonError> {
    insert(
        data,
        format!("{}_level_{}", reservoir, level),
        json!({
            "type": "monthlyprofile",
            "url": url,
            "index_col": [0, 1],
            "index": [level, reservoir]
        }),
    )
}

/// Adds one control curve per level and the index parameter
/// selecting the current saving level from the storage of
/// `reservoir`. Returns the index parameter's name.
pub fn add_demand_saving_index(
    data: &mut Value,
    reservoir: &str,
    url: &str,
    levels: &[u32],
) -> Result<String, ModelJsonError> {
    let control_curves = levels
        .iter()
        .map(|&level| add_demand_saving_control_curve(data, reservoir, url, level))
        .collect::<Result<Vec<_>, _>>()?;
    insert(
        data,
        format!("{}_demand_saving_index", reservoir),
        json!({
            "type": "controlcurveindex",
            "storage_node": reservoir,
            "control_curves": control_curves
        }),
    )
}

fn insert(data: &mut Value, name: String, parameter: Value) -> Result<String, ModelJsonError> {
    parameters_mut(data)?.insert(name.clone(), parameter);
    Ok(name)
}
