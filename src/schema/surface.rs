//! The editing surface a menu or inspector drives.
//!
//! UI layers talk to a node through [`SlotEditor`], or send [`SlotCommand`]s as JSON
//! and dispatch them with [`apply_command`].

use super::{NodeSchema, PinKey, SlotId};
use crate::error::{SchemaError, SchemaWarning};
use crate::value::{SlotType, Value};
use serde::{Deserialize, Serialize};

/// A row of the slot list shown to the author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotDescriptor {
    pub id: SlotId,
    pub name: String,
    pub slot_type: SlotType,
    pub default: Option<Value>,
    pub connected: bool,
    pub position: usize,
}

pub trait SlotEditor {
    fn add_slot(&mut self, proposed: Option<&str>, slot_type: SlotType) -> SlotId;
    fn remove_slot(&mut self, id: SlotId) -> Result<(), SchemaError>;
    fn rename_slot(&mut self, id: SlotId, new_name: &str) -> Result<(), SchemaError>;
    /// Renames with a `_N` suffix on collision. Returns the name actually used.
    fn rename_slot_disambiguated(
        &mut self,
        id: SlotId,
        new_name: &str,
    ) -> Result<String, SchemaError>;
    fn change_slot_type(
        &mut self,
        id: SlotId,
        new_type: SlotType,
    ) -> Result<Vec<SchemaWarning>, SchemaError>;
    fn slot_list(&self) -> Vec<SlotDescriptor>;
    /// A free name close to `proposed`, as a rename would need it.
    fn suggest_name(&self, proposed: &str, renaming: Option<SlotId>) -> String;
}

impl SlotEditor for NodeSchema {
    fn add_slot(&mut self, proposed: Option<&str>, slot_type: SlotType) -> SlotId {
        NodeSchema::add_slot(self, proposed, slot_type)
    }

    fn remove_slot(&mut self, id: SlotId) -> Result<(), SchemaError> {
        NodeSchema::remove_slot(self, id).map(|_| ())
    }

    fn rename_slot(&mut self, id: SlotId, new_name: &str) -> Result<(), SchemaError> {
        NodeSchema::rename_slot(self, id, new_name)
    }

    fn rename_slot_disambiguated(
        &mut self,
        id: SlotId,
        new_name: &str,
    ) -> Result<String, SchemaError> {
        NodeSchema::rename_slot_disambiguated(self, id, new_name)
    }

    fn change_slot_type(
        &mut self,
        id: SlotId,
        new_type: SlotType,
    ) -> Result<Vec<SchemaWarning>, SchemaError> {
        NodeSchema::change_slot_type(self, id, new_type)
    }

    fn slot_list(&self) -> Vec<SlotDescriptor> {
        self.slots()
            .iter()
            .enumerate()
            .map(|(position, slot)| SlotDescriptor {
                id: slot.id,
                name: slot.name.clone(),
                slot_type: slot.slot_type,
                default: slot.default.clone(),
                connected: self.connection(PinKey::Slot(slot.id)).is_some(),
                position,
            })
            .collect()
    }

    fn suggest_name(&self, proposed: &str, renaming: Option<SlotId>) -> String {
        self.unique_name(Some(proposed), renaming)
    }
}

/// A menu action, as sent by an external authoring UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SlotCommand {
    Add {
        #[serde(default)]
        name: Option<String>,
        #[serde(rename = "type")]
        slot_type: SlotType,
    },
    Remove {
        slot: SlotId,
    },
    Rename {
        slot: SlotId,
        name: String,
        #[serde(default)]
        auto_suffix: bool,
    },
    Retype {
        slot: SlotId,
        #[serde(rename = "type")]
        slot_type: SlotType,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandOutcome {
    /// The slot the command created or touched.
    pub slot: Option<SlotId>,
    pub warnings: Vec<SchemaWarning>,
}

pub fn apply_command<E: SlotEditor + ?Sized>(
    editor: &mut E,
    command: SlotCommand,
) -> Result<CommandOutcome, SchemaError> {
    match command {
        SlotCommand::Add { name, slot_type } => {
            let id = editor.add_slot(name.as_deref(), slot_type);
            Ok(CommandOutcome {
                slot: Some(id),
                warnings: Vec::new(),
            })
        }
        SlotCommand::Remove { slot } => {
            editor.remove_slot(slot)?;
            Ok(CommandOutcome {
                slot: Some(slot),
                warnings: Vec::new(),
            })
        }
        SlotCommand::Rename {
            slot,
            name,
            auto_suffix,
        } => {
            if auto_suffix {
                editor.rename_slot_disambiguated(slot, &name)?;
            } else {
                editor.rename_slot(slot, &name)?;
            }
            Ok(CommandOutcome {
                slot: Some(slot),
                warnings: Vec::new(),
            })
        }
        SlotCommand::Retype { slot, slot_type } => {
            let warnings = editor.change_slot_type(slot, slot_type)?;
            Ok(CommandOutcome {
                slot: Some(slot),
                warnings,
            })
        }
    }
}
