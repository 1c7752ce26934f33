//! Card composer orchestration
//!
//! [`CardEngine`] wires the assembly, the label builder, the picker and the
//! exporter together and keeps them consistent: every assembly mutation
//! refreshes the picker, and a dragged label's new position is written
//! back into its stored [`LabelSpec`] so later rebuilds keep it.

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::config::{ExportConfig, ForgeConfig};
use crate::events::EventSystem;
use crate::export::{self, ExportError, ExportFormat, MeshExporter};
use crate::foundation::math::Vec3;
use crate::input::Picker;
use crate::physics::collision::Ray;
use crate::render::text::{GlyphOutliner, LabelBuilder, LabelSpec};
use crate::scene::{CardAssembly, CardParameters, FragmentId, SceneError};

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or was invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Card or label update failed; the previous state is kept
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Export failed; nothing was written
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// The composer: one card, its labels and the interaction state
pub struct CardEngine<G: GlyphOutliner> {
    assembly: CardAssembly,
    labels: LabelBuilder<G>,
    specs: Vec<LabelSpec>,
    picker: Picker,
    events: EventSystem,
    exporter: MeshExporter,
    export_config: ExportConfig,
}

impl<G: GlyphOutliner> CardEngine<G> {
    /// Create the engine from a validated configuration
    ///
    /// The card base (and frame) is built immediately and the font load is
    /// started; labels are built by [`apply_catalog`](Self::apply_catalog).
    pub fn new(config: &ForgeConfig, outliner: G) -> Result<Self, EngineError> {
        log::info!("Initializing card engine...");
        config.validate()?;

        let assembly = CardAssembly::new(config.card, config.layout)?;
        let labels = LabelBuilder::new(outliner, &config.font.url, config.layout);

        let mut engine = Self {
            assembly,
            labels,
            specs: config.labels.clone(),
            picker: Picker::new(),
            events: EventSystem::new(),
            exporter: MeshExporter::new().with_solid_name(config.export.base_name.clone()),
            export_config: config.export.clone(),
        };
        engine.refresh_picker();
        Ok(engine)
    }

    fn refresh_picker(&mut self) {
        self.picker.refresh(&self.assembly, &mut self.events);
    }

    /// The card assembly
    pub fn assembly(&self) -> &CardAssembly {
        &self.assembly
    }

    /// The picker state
    pub fn picker(&self) -> &Picker {
        &self.picker
    }

    /// Notification queue; register handlers or drain events here
    pub fn events_mut(&mut self) -> &mut EventSystem {
        &mut self.events
    }

    /// Stored label specs in catalog order
    pub fn label_specs(&self) -> &[LabelSpec] {
        &self.specs
    }

    /// Stored spec for a label id
    pub fn label_spec(&self, id: &str) -> Option<&LabelSpec> {
        self.specs.iter().find(|spec| spec.id == id)
    }

    /// Rebuild base and frame
    pub fn update_card(&mut self, params: CardParameters) -> Result<(), EngineError> {
        self.assembly.set_card_parameters(params)?;
        self.refresh_picker();
        Ok(())
    }

    /// Build (or remove, for blank text) one label and remember its spec
    pub async fn update_label(&mut self, spec: LabelSpec) -> Result<Option<FragmentId>, EngineError> {
        let result = self.assembly.set_label(&mut self.labels, &spec).await;
        self.refresh_picker();
        let fragment = result?;

        match self.specs.iter_mut().find(|stored| stored.id == spec.id) {
            Some(stored) => *stored = spec,
            None => self.specs.push(spec),
        }
        Ok(fragment)
    }

    /// Build every stored label; returns how many produced a fragment
    pub async fn apply_catalog(&mut self) -> Result<usize, EngineError> {
        let mut built = 0;
        for spec in self.specs.clone() {
            if self.update_label(spec).await?.is_some() {
                built += 1;
            }
        }
        log::info!("Applied label catalog: {} of {} labels built", built, self.specs.len());
        Ok(built)
    }

    /// Pointer pressed along `ray`
    pub fn pointer_down(&mut self, ray: &Ray) -> Option<FragmentId> {
        self.picker.on_pointer_down(&self.assembly, ray, &mut self.events)
    }

    /// Pointer moved along `ray`; drags the held label
    pub fn pointer_move(&mut self, ray: &Ray) -> Result<Option<Vec3>, EngineError> {
        let moved = self.picker.on_pointer_move(&mut self.assembly, ray, &mut self.events)?;

        if let (Some(position), Some(fragment)) = (moved, self.picker.selected()) {
            if let Some(id) = self.assembly.label_id(fragment) {
                if let Some(spec) = self.specs.iter_mut().find(|spec| spec.id == id) {
                    spec.x = position.x;
                    spec.y = position.y;
                }
            }
        }
        Ok(moved)
    }

    /// Pointer released
    pub fn pointer_up(&mut self) -> Option<FragmentId> {
        self.picker.on_pointer_up(&self.assembly, &mut self.events)
    }

    /// Label under the pointer, for cursor feedback
    pub fn hover(&self, ray: &Ray) -> Option<FragmentId> {
        self.picker.hover(&self.assembly, ray)
    }

    /// Format configured as the default
    pub fn default_format(&self) -> Result<ExportFormat, EngineError> {
        Ok(self.export_config.default_format.parse()?)
    }

    /// File name for an export in `format`
    pub fn export_file_name(&self, format: ExportFormat) -> String {
        export::export_file_name(&self.export_config.base_name, format)
    }

    /// Serialize the card
    ///
    /// Callers await pending label builds before exporting; `&mut self`
    /// on the builders makes an export during a build impossible.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, EngineError> {
        Ok(self.exporter.export(&self.assembly, format)?)
    }

    /// Release every fragment; returns how many were disposed
    pub fn teardown(self) -> Result<usize, EngineError> {
        Ok(self.assembly.teardown()?)
    }
}
