//! The parsed input font, shared by every instance of a run.

use log::info;

use crate::{
    AxisLocation,
    container::{FontContainer, Flavor},
    error::Result,
    instance::{InstanceRequest, StaticFontInstance, build},
    location::{Normalizer, ResolvedLocation},
    names::NameLookup,
    options::Options,
    registry::{Axis, NamedInstance, extract_axes, extract_named_instances},
    store::VariationStore,
};

/// A variable font with its axes, named instances and decoded variation
/// data. Immutable once loaded.
#[derive(Debug)]
pub struct VariableFont<'a> {
    container: FontContainer<'a>,
    axes: Vec<Axis>,
    instances: Vec<NamedInstance>,
    normalizer: Normalizer,
    store: VariationStore,
    family: String,
}

impl<'a> VariableFont<'a> {
    /// Parse `data` and decode everything instances are built from.
    ///
    /// # Errors
    ///
    /// Only fatal errors: a malformed container or table header, a font
    /// without `fvar`, or a font without `glyf` outlines.
    pub fn load(data: &'a [u8]) -> Result<Self> {
        let container = FontContainer::parse(data)?;
        let axes = extract_axes(&container)?;
        let instances = extract_named_instances(&container, &axes)?;
        let normalizer = Normalizer::load(&container, &axes)?;
        let store = VariationStore::load(&container, &axes)?;
        let family = NameLookup::new(&container).family_name();

        info!(
            "{family}: {} axes, {} named instances, {} regions",
            axes.len(),
            instances.len(),
            store.regions().len()
        );
        Ok(Self { container, axes, instances, normalizer, store, family })
    }

    pub fn container(&self) -> &FontContainer<'a> {
        &self.container
    }

    pub fn flavor(&self) -> Flavor {
        self.container.flavor()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn named_instances(&self) -> &[NamedInstance] {
        &self.instances
    }

    pub fn store(&self) -> &VariationStore {
        &self.store
    }

    /// Typographic family name used for instance names.
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn resolve(&self, location: &[AxisLocation], warn_on_clamp: bool) -> Result<ResolvedLocation> {
        self.normalizer.resolve(location, warn_on_clamp)
    }

    pub fn build(&self, request: &InstanceRequest, options: &Options) -> Result<StaticFontInstance> {
        build(self, request, options)
    }
}
