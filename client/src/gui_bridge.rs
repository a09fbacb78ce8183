//! GUI bridge (§4.8): a thin facade with no business logic of its own.
//! Every method either delegates to the action bus, reads a cached slice
//! of scene state, or toggles a tool. The one rule it enforces itself is
//! the `has_current_table` preflight on mutating calls.

use vtt_core::types::{Position, Table};

use crate::action_bus::{ActionResult, Actions};
use crate::render::{FogTool, FogToolMode};

pub struct GuiBridge {
    actions: Actions,
    fog_tool: FogTool,
    fog_tool_active: bool,
}

impl GuiBridge {
    pub fn new(actions: Actions) -> Self {
        GuiBridge {
            actions,
            fog_tool: FogTool::new(),
            fog_tool_active: false,
        }
    }

    fn require_current_table(&self) -> Result<(), ActionResult> {
        if self.actions.scene().has_current_table() {
            Ok(())
        } else {
            Err(ActionResult::err("no current table"))
        }
    }

    pub fn current_table(&self) -> Option<&Table> {
        self.actions.scene().current_table()
    }

    pub fn move_sprite(&mut self, sprite_id: &str, old_pos: Position, new_pos: Position) -> ActionResult {
        if let Err(e) = self.require_current_table() {
            return e;
        }
        let table_id = self.actions.scene().current_table().unwrap().table_id.clone();
        self.actions.move_sprite(&table_id, sprite_id, old_pos, new_pos, true)
    }

    pub fn delete_sprite(&mut self, sprite_id: &str) -> ActionResult {
        if let Err(e) = self.require_current_table() {
            return e;
        }
        let table_id = self.actions.scene().current_table().unwrap().table_id.clone();
        self.actions.delete_sprite(&table_id, sprite_id, true)
    }

    pub fn set_fog_tool_active(&mut self, active: bool) {
        self.fog_tool_active = active;
        if !active {
            self.fog_tool.deactivate();
        }
    }

    pub fn set_fog_tool_mode(&mut self, mode: FogToolMode) {
        self.fog_tool.mode = mode;
    }

    pub fn fog_tool_mouse_down(&mut self, table_point: (f64, f64)) -> ActionResult {
        if let Err(e) = self.require_current_table() {
            return e;
        }
        if !self.fog_tool_active {
            return ActionResult::err("fog tool is not active");
        }
        self.fog_tool.on_mouse_down(table_point);
        ActionResult::ok("fog rectangle started")
    }

    pub fn fog_tool_mouse_up(&mut self) -> ActionResult {
        if let Err(e) = self.require_current_table() {
            return e;
        }
        let Some(rect) = self.fog_tool.on_mouse_up() else {
            return ActionResult::err("fog tool was not drawing");
        };
        let table_id = self.actions.scene().current_table().unwrap().table_id.clone();
        let table = self.actions.scene().table(&table_id).unwrap();
        let mut hide = table.fog_rectangles.hide.clone();
        let mut reveal = table.fog_rectangles.reveal.clone();
        match self.fog_tool.mode {
            FogToolMode::Hide => hide.push(rect),
            FogToolMode::Reveal => reveal.push(rect),
        }
        self.actions.update_fog(&table_id, hide, reveal, true)
    }

    pub fn undo(&mut self) -> ActionResult {
        self.actions.undo()
    }

    pub fn redo(&mut self) -> ActionResult {
        self.actions.redo()
    }

    pub fn actions_mut(&mut self) -> &mut Actions {
        &mut self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn mutation_rejected_when_there_is_no_current_table() {
        let mut bridge = GuiBridge::new(Actions::new(Scene::new()));
        let result = bridge.move_sprite("s1", Position::ZERO, Position::new(1.0, 1.0));
        assert!(!result.success);
    }

    #[test]
    fn fog_tool_requires_activation_before_drawing() {
        let mut actions = Actions::new(Scene::new());
        actions.create_table("T", 100.0, 100.0, false);
        let mut bridge = GuiBridge::new(actions);
        let result = bridge.fog_tool_mouse_down((10.0, 10.0));
        assert!(!result.success);
    }

    #[test]
    fn fog_tool_draws_a_hide_rectangle_end_to_end() {
        let mut actions = Actions::new(Scene::new());
        actions.create_table("T", 100.0, 100.0, false);
        let mut bridge = GuiBridge::new(actions);
        bridge.set_fog_tool_active(true);
        bridge.fog_tool_mouse_down((10.0, 10.0));
        let result = bridge.fog_tool_mouse_up();
        assert!(result.success);
        assert_eq!(bridge.current_table().unwrap().fog_rectangles.hide.len(), 1);
    }
}
