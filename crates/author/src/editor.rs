use glam::Vec2;
use shellfur_common::Color;
use shellfur_shell::{ParameterField, ShellError, ShellFur, Stage};

/// A parameter edit that can be applied to a fur and reversed.
///
/// Each command carries enough context to undo itself.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Change one scalar. Undo = restore the old value.
    SetScalar {
        field: ParameterField,
        old: f32,
        new: f32,
    },
    SetColor { old: Color, new: Color },
    /// Change the wind direction change speed. `None` turns it off.
    SetWind {
        old: Option<Vec2>,
        new: Option<Vec2>,
    },
}

impl EditCommand {
    /// Produce the inverse command (for undo).
    pub fn inverse(&self) -> Self {
        match self {
            Self::SetScalar { field, old, new } => Self::SetScalar {
                field: *field,
                old: *new,
                new: *old,
            },
            Self::SetColor { old, new } => Self::SetColor {
                old: *new,
                new: *old,
            },
            Self::SetWind { old, new } => Self::SetWind {
                old: *new,
                new: *old,
            },
        }
    }
}

/// Errors from edit operations.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// The edit was recorded but republishing it failed.
    #[error("reapplying parameters failed: {0}")]
    Reapply(#[from] ShellError),
}

/// Parameter editor with undo/redo.
///
/// Values are clamped into their declared range before they reach the fur,
/// and every applied edit, undo or redo is followed by
/// [`ShellFur::on_parameters_changed`], which honors the fur's auto-update flag.
#[derive(Debug, Default)]
pub struct ParameterEditor {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl ParameterEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one scalar. Returns `false` when the clamped value equals the current one.
    pub fn set_scalar(
        &mut self,
        fur: &mut ShellFur,
        stage: &mut Stage,
        field: ParameterField,
        value: f32,
    ) -> Result<bool, EditError> {
        let (min, max) = field.range();
        let mut new = value.clamp(min, max);
        if field.is_integer() {
            new = new.round();
        }
        if new != value {
            tracing::warn!(field = field.key(), value, clamped = new, "edit clamped into range");
        }
        let old = field.get(fur.params());
        if old == new {
            return Ok(false);
        }
        self.record(fur, stage, EditCommand::SetScalar { field, old, new })
    }

    pub fn set_color(
        &mut self,
        fur: &mut ShellFur,
        stage: &mut Stage,
        color: Color,
    ) -> Result<bool, EditError> {
        let old = fur.params().shell_color;
        if old == color {
            return Ok(false);
        }
        self.record(fur, stage, EditCommand::SetColor { old, new: color })
    }

    pub fn set_wind(
        &mut self,
        fur: &mut ShellFur,
        stage: &mut Stage,
        wind: Option<Vec2>,
    ) -> Result<bool, EditError> {
        let old = fur.params().wind_dir_change_speed;
        if old == wind {
            return Ok(false);
        }
        self.record(fur, stage, EditCommand::SetWind { old, new: wind })
    }

    fn record(
        &mut self,
        fur: &mut ShellFur,
        stage: &mut Stage,
        cmd: EditCommand,
    ) -> Result<bool, EditError> {
        apply_command(fur, &cmd);
        tracing::debug!(?cmd, "parameter edit");
        self.undo_stack.push(cmd);
        self.redo_stack.clear();
        fur.on_parameters_changed(stage)?;
        Ok(true)
    }

    /// Undo the last edit. Returns true if an operation was undone.
    pub fn undo(&mut self, fur: &mut ShellFur, stage: &mut Stage) -> Result<bool, EditError> {
        let Some(cmd) = self.undo_stack.pop() else {
            return Ok(false);
        };
        apply_command(fur, &cmd.inverse());
        self.redo_stack.push(cmd);
        fur.on_parameters_changed(stage)?;
        Ok(true)
    }

    /// Redo the last undone edit. Returns true if an operation was redone.
    pub fn redo(&mut self, fur: &mut ShellFur, stage: &mut Stage) -> Result<bool, EditError> {
        let Some(cmd) = self.redo_stack.pop() else {
            return Ok(false);
        };
        apply_command(fur, &cmd);
        self.undo_stack.push(cmd);
        fur.on_parameters_changed(stage)?;
        Ok(true)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

fn apply_command(fur: &mut ShellFur, cmd: &EditCommand) {
    let params = fur.params_mut();
    match cmd {
        EditCommand::SetScalar { field, new, .. } => field.set(params, *new),
        EditCommand::SetColor { new, .. } => params.shell_color = *new,
        EditCommand::SetWind { new, .. } => params.wind_dir_change_speed = *new,
    }
}
