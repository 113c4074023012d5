//! The tunable kernel parameters in a format amenable to being put in JSON,
//! plus the keyboard mapping used to adjust them interactively. Each parameter
//! carries a documented range; values are clamped to it at the editing
//! boundary and validated against it when a settings file is loaded. The
//! kernel-facing path performs no checking of its own.

use winit::keyboard::KeyCode;

use crate::constants::SimParams;

macro_rules! sim_settings {
    (
        pub struct $name:ident;
        pub enum $param:ident { $(
            $case:ident = $field:ident = $key:ident in $lo:literal ..= $hi:literal,
        )* }
    ) => {
        #[derive(Debug, Clone, PartialEq, facet::Facet)]
        pub struct $name { $(
            pub $field: f32,
        )* }

        impl $name {
            /// Checks every parameter against its documented range.
            pub fn validate(&self) -> Result<(), String> {
                $(
                    if !($lo..=$hi).contains(&self.$field) {
                        return Err(format!(
                            "{} = {} is outside {}..={}",
                            stringify!($field),
                            self.$field,
                            $lo,
                            $hi,
                        ));
                    }
                )*
                Ok(())
            }

            pub fn to_params(&self, tex_size_x: u32, tex_size_y: u32) -> SimParams {
                SimParams {
                    $( $field: self.$field, )*
                    tex_size_x,
                    tex_size_y,
                }
            }
        }

        #[derive(Copy, Clone, PartialEq, Eq)]
        pub enum $param {
            $($case,)*
        }

        impl $param {
            // Returns whether this has handled the keypress
            pub fn apply(&self, settings: &mut DisplaySettings, key: KeyCode) -> bool {
                match self { $(
                    $param::$case => {
                        match key {
                            KeyCode::ArrowUp => {
                                settings.current.$field = (settings.current.$field
                                    + settings.increment.$field)
                                    .clamp($lo, $hi);
                            }
                            KeyCode::ArrowDown => {
                                settings.current.$field = (settings.current.$field
                                    - settings.increment.$field)
                                    .clamp($lo, $hi);
                            }
                            KeyCode::ArrowLeft if settings.increment.$field < 100.0 => {
                                settings.increment.$field *= 10.0;
                            }
                            KeyCode::ArrowRight if settings.increment.$field > 0.00001 => {
                                settings.increment.$field /= 10.0;
                            }
                            _ => return false,
                        };
                        true
                    }
                )* }
            }

            pub fn activate(key: KeyCode) -> Option<Self> {
                match key { $(
                    KeyCode::$key => Some($param::$case),
                )*
                    _ => None
                }
            }
        }
    }
}

sim_settings! {
    pub struct SimSettings;
    // Use the block in the left-hand side of the keyboard, in the same order
    // the parameters are rendered on the header line. The ranges are the
    // documented bounds each parameter is clamped to while editing.
    pub enum Param {
        GridSpacing = dx = KeyQ in 0.0..=10.0,
        TimeStep = delta_time = KeyW in 0.0..=1.0,
        Gravity = g = KeyE in 0.0..=100.0,
        Epsilon = epsilon = KeyA in 0.0..=1.0,
        Alpha = alpha = KeyS in 0.0..=10.0,
        Beta = beta = KeyD in 0.0..=10.0,
        BaseHeight = base_height = KeyF in 0.0..=1.0,
    }
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            dx: 1.0,
            delta_time: 0.001,
            g: 9.81,
            epsilon: 0.0001,
            alpha: 1.0,
            beta: 1.0,
            base_height: 0.0,
        }
    }
}

/// When a key is pressed, how much to adjust each parameter by.
pub const DEFAULT_INCREMENT: SimSettings = SimSettings {
    dx: 0.1,
    delta_time: 0.001,
    g: 0.1,
    epsilon: 0.0001,
    alpha: 0.1,
    beta: 0.1,
    base_height: 0.01,
};

/// These are the settings that are displayed at any given moment.
#[derive(Debug, Clone, PartialEq, facet::Facet)]
pub struct DisplaySettings {
    /// The actual values fed to the compute kernels.
    pub current: SimSettings,
    /// When a key is pressed, how much to adjust a given parameter by.
    pub increment: SimSettings,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            current: SimSettings::default(),
            increment: DEFAULT_INCREMENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        assert!(SimSettings::default().validate().is_ok());
        assert!(DEFAULT_INCREMENT.validate().is_ok());
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut settings = SimSettings::default();
        settings.g = 101.0;
        let err = settings.validate().unwrap_err();
        assert!(err.contains("g = 101"));

        let mut settings = SimSettings::default();
        settings.delta_time = -0.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn to_params_carries_every_field() {
        let settings = SimSettings::default();
        let params = settings.to_params(640, 480);
        assert_eq!(params.dx, settings.dx);
        assert_eq!(params.delta_time, settings.delta_time);
        assert_eq!(params.g, settings.g);
        assert_eq!(params.epsilon, settings.epsilon);
        assert_eq!(params.alpha, settings.alpha);
        assert_eq!(params.beta, settings.beta);
        assert_eq!(params.base_height, settings.base_height);
        assert_eq!(params.tex_size_x, 640);
        assert_eq!(params.tex_size_y, 480);
    }

    #[test]
    fn editing_clamps_to_the_documented_range() {
        let mut display = DisplaySettings::default();
        display.current.base_height = 1.0;
        display.increment.base_height = 0.5;
        assert!(Param::BaseHeight.apply(&mut display, KeyCode::ArrowUp));
        assert_eq!(display.current.base_height, 1.0);
        assert!(Param::BaseHeight.apply(&mut display, KeyCode::ArrowDown));
        assert_eq!(display.current.base_height, 0.5);
    }

    #[test]
    fn activation_keys_map_to_params() {
        assert!(matches!(Param::activate(KeyCode::KeyQ), Some(Param::GridSpacing)));
        assert!(matches!(Param::activate(KeyCode::KeyW), Some(Param::TimeStep)));
        assert!(matches!(Param::activate(KeyCode::KeyF), Some(Param::BaseHeight)));
        assert!(Param::activate(KeyCode::KeyR).is_none());
        assert!(Param::activate(KeyCode::Space).is_none());
    }
}
