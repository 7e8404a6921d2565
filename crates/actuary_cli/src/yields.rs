//! `actuary yield`: yield and normalized cost-per-area curves.

use std::error::Error;

use actuary_config::ParameterTable;
use actuary_model::{die_yield, normalized_cost_per_area, ModelResult};
use serde::Serialize;

use crate::{GlobalArgs, ReportFormat, YieldArgs};

/// A fabrication technology whose curves are tabulated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Technology {
    /// Column label: the node key, `RDL`, or `SI`.
    pub name: String,
    /// Defects per cm².
    pub defect_density: f64,
    /// Clustering parameter of the yield model.
    pub critical_level: f64,
}

/// Every process node in ascending feature size, then fan-out RDL and the
/// silicon interposer.
pub fn technologies(params: &ParameterTable) -> Vec<Technology> {
    let mut nodes: Vec<(&str, f64)> = params
        .nodes()
        .map(|(name, node)| (name, node.defect_density))
        .collect();
    nodes.sort_by(|(a, _), (b, _)| {
        let key = |n: &str| n.parse::<f64>().unwrap_or(f64::INFINITY);
        key(a).total_cmp(&key(b)).then_with(|| a.cmp(b))
    });

    let mut techs: Vec<Technology> = nodes
        .into_iter()
        .map(|(name, defect_density)| Technology {
            name: name.to_string(),
            defect_density,
            critical_level: params.manufacture.critical_level,
        })
        .collect();
    techs.push(Technology {
        name: "RDL".to_string(),
        defect_density: params.fan_out.defect_density,
        critical_level: params.fan_out.critical_level,
    });
    techs.push(Technology {
        name: "SI".to_string(),
        defect_density: params.silicon.defect_density,
        critical_level: params.silicon.critical_level,
    });
    techs
}

/// Curves for one die area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveRow {
    /// Die area in mm².
    pub area: f64,
    /// Yield per technology, in column order.
    pub yields: Vec<f64>,
    /// Normalized cost per mm² per technology, in column order.
    pub normalized_cost: Vec<f64>,
}

/// The full table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveTable {
    /// Column definitions.
    pub technologies: Vec<Technology>,
    /// One row per die area.
    pub rows: Vec<CurveRow>,
}

impl CurveTable {
    /// Tabulates areas `1², 2², …, max_side²` mm².
    pub fn build(params: &ParameterTable, max_side: u32) -> ModelResult<Self> {
        let technologies = technologies(params);
        let mut rows = Vec::with_capacity(max_side as usize);
        for side in 1..=max_side {
            let area = f64::from(side * side);
            let mut yields = Vec::with_capacity(technologies.len());
            let mut normalized_cost = Vec::with_capacity(technologies.len());
            for tech in &technologies {
                yields.push(die_yield(area, tech.defect_density, tech.critical_level));
                normalized_cost.push(normalized_cost_per_area(
                    area,
                    tech.defect_density,
                    tech.critical_level,
                    &params.manufacture,
                )?);
            }
            rows.push(CurveRow {
                area,
                yields,
                normalized_cost,
            });
        }
        Ok(Self { technologies, rows })
    }

    /// Renders the yield block followed by the cost block.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        self.render_block(&mut out, "Yield", |r| r.yields.as_slice());
        self.render_block(&mut out, "Normalized cost per area", |r| r.normalized_cost.as_slice());
        out
    }

    fn render_block(&self, out: &mut String, title: &str, pick: impl Fn(&CurveRow) -> &[f64]) {
        out.push_str(title);
        out.push('\n');
        out.push_str(&format!("{:>8}", "area"));
        for tech in &self.technologies {
            out.push_str(&format!("{:>9}", tech.name));
        }
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format!("{:>8.0}", row.area));
            for value in pick(row) {
                out.push_str(&format!("{value:>9.4}"));
            }
            out.push('\n');
        }
        out.push('\n');
    }
}

/// Runs the `actuary yield` command.
pub fn run(args: &YieldArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let params = global.parameters()?;
    let table = CurveTable::build(&params, args.max_side)?;
    match args.format {
        ReportFormat::Text => print!("{}", table.render_text()),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
    }
    Ok(0)
}
