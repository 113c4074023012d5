//! Play/pause state and the frame command queue. Keyboard events push
//! [`Command`]s as they arrive; the render loop drains them exactly once per
//! frame via [`Controller::tick`], so all simulation work stays
//! frame-synchronous on one thread.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Flip between paused and running.
    TogglePlay,
    /// Re-run the initialization kernel and force pause.
    Reset,
    /// Run exactly one simulation step, leaving the play state alone.
    Step,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayState {
    Paused,
    Running,
}

/// Work the current frame has to do, as decided by the drained commands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Re-dispatch the initialization kernel before anything else.
    pub reinitialize: bool,
    /// How many simulation steps to run this frame.
    pub steps: u32,
}

pub struct Controller {
    state: PlayState,
    queue: Vec<Command>,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            state: PlayState::Paused,
            queue: Vec::new(),
        }
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Drains the queued commands in arrival order and returns the work for
    /// this frame. While running, each frame contributes one step of its own;
    /// a step command contributes exactly one step, never more.
    pub fn tick(&mut self) -> Tick {
        let mut tick = Tick {
            reinitialize: false,
            steps: 0,
        };
        for command in self.queue.drain(..) {
            match command {
                Command::TogglePlay => {
                    self.state = match self.state {
                        PlayState::Paused => PlayState::Running,
                        PlayState::Running => PlayState::Paused,
                    };
                }
                Command::Reset => {
                    self.state = PlayState::Paused;
                    tick.reinitialize = true;
                }
                Command::Step => tick.steps += 1,
            }
        }
        if self.state == PlayState::Running {
            tick.steps += 1;
        }
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_restores_play_state() {
        let mut controller = Controller::new();
        let before = controller.state();
        controller.push(Command::TogglePlay);
        controller.tick();
        controller.push(Command::TogglePlay);
        controller.tick();
        assert_eq!(controller.state(), before);
    }

    #[test]
    fn reset_always_lands_paused() {
        let mut controller = Controller::new();
        controller.push(Command::Reset);
        let tick = controller.tick();
        assert_eq!(controller.state(), PlayState::Paused);
        assert!(tick.reinitialize);
        assert_eq!(tick.steps, 0);

        controller.push(Command::TogglePlay);
        controller.tick();
        assert_eq!(controller.state(), PlayState::Running);
        controller.push(Command::Reset);
        let tick = controller.tick();
        assert_eq!(controller.state(), PlayState::Paused);
        assert!(tick.reinitialize);
        assert_eq!(tick.steps, 0);
    }

    #[test]
    fn one_step_per_trigger_never_more() {
        let mut controller = Controller::new();
        controller.push(Command::Step);
        assert_eq!(controller.tick().steps, 1);

        controller.push(Command::Step);
        controller.push(Command::Step);
        assert_eq!(controller.tick().steps, 2);

        // Stepping does not change the play state.
        assert_eq!(controller.state(), PlayState::Paused);
        assert_eq!(controller.tick().steps, 0);
    }

    #[test]
    fn running_contributes_one_step_per_frame() {
        let mut controller = Controller::new();
        controller.push(Command::TogglePlay);
        assert_eq!(controller.tick().steps, 1);
        assert_eq!(controller.tick().steps, 1);
        controller.push(Command::TogglePlay);
        assert_eq!(controller.tick().steps, 0);
    }

    #[test]
    fn commands_drain_once() {
        let mut controller = Controller::new();
        controller.push(Command::Reset);
        assert!(controller.tick().reinitialize);
        assert!(!controller.tick().reinitialize);
    }
}
