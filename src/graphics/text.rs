use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use wgpu_text::BrushBuilder;
use wgpu_text::TextBrush;
use wgpu_text::glyph_brush::Layout;
use wgpu_text::glyph_brush::OwnedSection;
use wgpu_text::glyph_brush::OwnedText;
use wgpu_text::glyph_brush::Section;
use wgpu_text::glyph_brush::ab_glyph::FontRef;
use winit::dpi::PhysicalSize;

use crate::constants::HEADER_HEIGHT;
use crate::control::PlayState;
use crate::fs::{DisplaySettings, Param, SimSettings};
use crate::graphics::Mode;

pub struct Pipeline<'a> {
    brush: TextBrush<FontRef<'a>>,
    section: OwnedSection,
}

/// A single row of text fills the header.
const FONT_SIZE: f32 = HEADER_HEIGHT as f32 - 6.0;

const COLOR_WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const COLOR_GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const COLOR_RED: [f32; 4] = [1.0, 0.3, 0.2, 1.0];

fn format_status(settings: &DisplaySettings, state: PlayState) -> [String; 8] {
    let SimSettings {
        dx,
        delta_time,
        g,
        epsilon,
        alpha,
        beta,
        base_height,
    } = &settings.current;
    let SimSettings {
        dx: dx_incr,
        delta_time: dt_incr,
        g: g_incr,
        epsilon: eps_incr,
        alpha: alpha_incr,
        beta: beta_incr,
        base_height: h0_incr,
    } = &settings.increment;

    const WIDTH: usize = 7;
    const PREC: usize = 4;
    [
        match state {
            PlayState::Running => "RUNNING  ".to_string(),
            PlayState::Paused => "PAUSED   ".to_string(),
        },
        format!("DX:{dx:>WIDTH$.PREC$}({dx_incr:+.PREC$})  "),
        format!("DT:{delta_time:>WIDTH$.PREC$}({dt_incr:+.PREC$})  "),
        format!("G:{g:>WIDTH$.PREC$}({g_incr:+.PREC$})  "),
        format!("EPS:{epsilon:>WIDTH$.PREC$}({eps_incr:+.PREC$})  "),
        format!("A:{alpha:>WIDTH$.PREC$}({alpha_incr:+.PREC$})  "),
        format!("B:{beta:>WIDTH$.PREC$}({beta_incr:+.PREC$})  "),
        format!("H0:{base_height:>WIDTH$.PREC$}({h0_incr:+.PREC$})"),
    ]
}

/// Index of a param's cell in the status line. Slot 0 is the play state.
fn param_to_index(param: Param) -> usize {
    use Param::*;
    match param {
        GridSpacing => 1,
        TimeStep => 2,
        Gravity => 3,
        Epsilon => 4,
        Alpha => 5,
        Beta => 6,
        BaseHeight => 7,
    }
}

impl Pipeline<'_> {
    pub fn new(
        device: &wgpu::Device,
        _queue: &wgpu::Queue,
        size: PhysicalSize<u32>,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let font_handle = SystemSource::new()
            .select_best_match(&[FamilyName::Monospace], &Properties::new())
            .expect("Did not find system monospace font");
        let font_vec = match font_handle {
            Handle::Memory { bytes, .. } => Vec::clone(&bytes),
            Handle::Path { path, .. } => std::fs::read(path).expect("failed to read font file"),
        };
        let font_bytes: &'static mut [u8] = font_vec.leak();
        let brush_builder =
            BrushBuilder::using_font_bytes(font_bytes).expect("failed to load font");
        let brush = brush_builder.build(device, size.width, size.height, surface_format);

        let section = Section::default().with_layout(Layout::default()).to_owned();

        Self { brush, section }
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, new_size: PhysicalSize<u32>) {
        self.section.bounds = (new_size.width as f32, HEADER_HEIGHT as f32);
        self.section.screen_position = (0.0, 0.0);
        self.brush
            .resize_view(new_size.width as f32, new_size.height as f32, queue);
    }

    /// Rebuilds the status line. Called every frame; the section is tiny.
    pub fn set_status(&mut self, settings: &DisplaySettings, state: PlayState, mode: Mode) {
        let highlighted_index = match mode {
            Mode::Adjust(param) => Some(param_to_index(param)),
            Mode::Normal => None,
        };
        let state_color = match state {
            PlayState::Running => COLOR_GREEN,
            PlayState::Paused => COLOR_RED,
        };

        self.section.text.clear();
        self.section.text.extend(
            format_status(settings, state)
                .into_iter()
                .enumerate()
                .map(|(i, text)| {
                    OwnedText::default()
                        .with_text(text)
                        .with_scale(FONT_SIZE)
                        .with_color(if i == 0 {
                            state_color
                        } else if Some(i) == highlighted_index {
                            COLOR_GREEN
                        } else {
                            COLOR_WHITE
                        })
                }),
        );
    }

    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.brush
            .queue(device, queue, [&self.section])
            .expect("queuing brush");
    }

    pub fn render_pass<'pass>(&'pass self, render_pass: &mut wgpu::RenderPass<'pass>) {
        self.brush.draw(render_pass);
    }
}
