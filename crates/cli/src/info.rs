//! `--info`: what a variable font offers.

use std::fmt::Write;

use font_instancer::{VariableFont, location_label};

pub fn describe(font: &VariableFont) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Family: {}", font.family());
    let _ = writeln!(out, "Axes:");
    for axis in font.axes() {
        let hidden = if axis.hidden { " (hidden)" } else { "" };
        let _ = writeln!(
            out,
            "  {} {}: {} .. {} .. {}{hidden}",
            axis.tag, axis.name, axis.min, axis.default, axis.max
        );
    }
    let _ = writeln!(out, "Named instances:");
    if font.named_instances().is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for instance in font.named_instances() {
        let coordinate = location_label(instance.coordinate.iter().map(|(tag, value)| (*tag, *value)));
        let _ = writeln!(out, "  {}: {coordinate}", instance.name);
    }
    out
}
