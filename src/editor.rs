// Small egui editor: one slider per parameter plus the reported latency

use nih_plug::prelude::{nih_log, Editor};
use nih_plug_egui::{
    create_egui_editor,
    egui::{self, Color32, RichText},
    widgets::ParamSlider,
    EguiState,
};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crate::params::SatuMorpherParams;
use crate::preset::SatuPreset;

const WIDTH: u32 = 360;
const HEIGHT: u32 = 300;
const SLIDER_WIDTH: f32 = 200.0;

const TITLE_COLOR: Color32 = Color32::from_rgb(230, 160, 60);

pub(crate) fn default_state() -> Arc<EguiState> {
    EguiState::from_size(WIDTH, HEIGHT)
}

pub(crate) fn create(
    params: Arc<SatuMorpherParams>,
    reported_latency: Arc<AtomicU32>,
) -> Option<Box<dyn Editor>> {
    create_egui_editor(
        params.editor_state.clone(),
        (),
        |_, _| {},
        move |egui_ctx, setter, _state| {
            egui::CentralPanel::default().show(egui_ctx, |ui| {
                ui.label(RichText::new("SatuMorpher").size(22.0).color(TITLE_COLOR));
                ui.separator();

                egui::Grid::new("satu_params")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Drive");
                        ui.add(ParamSlider::for_param(&params.drive, setter).with_width(SLIDER_WIDTH));
                        ui.end_row();

                        ui.label("Morph");
                        ui.add(ParamSlider::for_param(&params.morph, setter).with_width(SLIDER_WIDTH));
                        ui.end_row();

                        ui.label("Left Type");
                        ui.add(ParamSlider::for_param(&params.left_type, setter).with_width(SLIDER_WIDTH));
                        ui.end_row();

                        ui.label("Right Type");
                        ui.add(ParamSlider::for_param(&params.right_type, setter).with_width(SLIDER_WIDTH));
                        ui.end_row();

                        ui.label("Output");
                        ui.add(ParamSlider::for_param(&params.output, setter).with_width(SLIDER_WIDTH));
                        ui.end_row();

                        ui.label("Oversampling");
                        ui.add(
                            ParamSlider::for_param(&params.oversample_mode, setter)
                                .with_width(SLIDER_WIDTH),
                        );
                        ui.end_row();
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    let latency = reported_latency.load(Ordering::Relaxed);
                    ui.label(format!("Latency: {} samples", latency));
                    if ui.button("Reset to defaults").clicked() {
                        SatuPreset::default().apply(setter, &params);
                        nih_log!("Parameters reset to defaults");
                    }
                });
            });
        },
    )
}
