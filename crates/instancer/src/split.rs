//! Building many instances of one font in parallel.

use std::collections::HashSet;

use log::{info, warn};
use rayon::prelude::*;

use crate::{
    AxisLocation,
    error::{Error, Result},
    font::VariableFont,
    instance::InstanceRequest,
    naming::InstanceNames,
    options::Options,
    serialize::serialize,
};

/// Which instances a run builds.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Every named instance declared in `fvar`.
    NamedInstances,
    /// A single explicit location. Axes it does not mention stay at their
    /// default.
    Location(Vec<AxisLocation>),
}

#[derive(Debug)]
pub enum Outcome {
    /// The serialized static font.
    Built(Vec<u8>),
    Failed(Error),
    /// Another instance of the run already claimed the file name.
    Skipped,
}

#[derive(Debug)]
pub struct InstanceReport {
    /// Subfamily the instance was built for.
    pub label: String,
    pub names: InstanceNames,
    pub file_name: String,
    pub outcome: Outcome,
}

impl InstanceReport {
    pub fn data(&self) -> Option<&[u8]> {
        match &self.outcome {
            Outcome::Built(data) => Some(data),
            _ => None,
        }
    }
}

/// Per-instance results, in request order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub instances: Vec<InstanceReport>,
}

impl RunReport {
    pub fn built(&self) -> impl Iterator<Item = &InstanceReport> {
        self.instances.iter().filter(|r| matches!(r.outcome, Outcome::Built(_)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&InstanceReport, &Error)> {
        self.instances.iter().filter_map(|r| match &r.outcome {
            Outcome::Failed(err) => Some((r, err)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> usize {
        self.instances.iter().filter(|r| matches!(r.outcome, Outcome::Skipped)).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Characters that may not appear in a file name on common platforms.
const FILE_NAME_FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace characters that are illegal in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_control() || FILE_NAME_FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// The requests a selection expands to.
///
/// An explicit location that lands on a named instance (after clamping)
/// borrows that instance's names.
pub fn plan(font: &VariableFont, selection: &Selection) -> Vec<InstanceRequest> {
    match selection {
        Selection::NamedInstances => font.named_instances().iter().map(InstanceRequest::named).collect(),
        Selection::Location(location) => {
            let mut request = InstanceRequest::at(location.clone());
            if let Ok(resolved) = font.resolve(location, false)
                && let Some(named) = font
                    .named_instances()
                    .iter()
                    .find(|named| named.coordinate.values().copied().eq(resolved.user.iter().copied()))
            {
                request.subfamily = named.name.clone();
                request.postscript_name = named.postscript_name.clone();
            }
            vec![request]
        }
    }
}

/// Load `data` and build every instance of `selection`.
///
/// # Errors
///
/// Only fatal errors, raised before any instance is attempted. Instance
/// failures are reported per instance in the [`RunReport`].
pub fn run(data: &[u8], selection: &Selection, options: &Options) -> Result<RunReport> {
    let font = VariableFont::load(data)?;
    Ok(run_font(&font, selection, options))
}

/// Build every instance of `selection` from an already loaded font.
pub fn run_font(font: &VariableFont, selection: &Selection, options: &Options) -> RunReport {
    let extension = options
        .extension
        .clone()
        .unwrap_or_else(|| font.flavor().extension().to_string());

    let mut claimed = HashSet::new();
    let planned: Vec<(InstanceRequest, InstanceNames, String, bool)> = plan(font, selection)
        .into_iter()
        .map(|request| {
            let names = request.names(font.family());
            let file_name = format!("{}.{extension}", sanitize_file_name(&names.full_name()));
            let unique = claimed.insert(file_name.to_lowercase());
            if !unique {
                warn!("{file_name}: already written by an earlier instance, skipping '{}'", request.subfamily);
            }
            (request, names, file_name, unique)
        })
        .collect();

    let instances: Vec<InstanceReport> = planned
        .into_par_iter()
        .map(|(request, names, file_name, unique)| {
            let outcome = if unique {
                match font
                    .build(&request, options)
                    .and_then(|instance| serialize(&instance).map_err(Error::from))
                {
                    Ok(data) => Outcome::Built(data),
                    Err(err) => Outcome::Failed(err),
                }
            } else {
                Outcome::Skipped
            };
            InstanceReport { label: request.subfamily, names, file_name, outcome }
        })
        .collect();

    let report = RunReport { instances };
    info!(
        "{}: {} built, {} failed, {} skipped",
        font.family(),
        report.built().count(),
        report.failed().count(),
        report.skipped()
    );
    report
}
