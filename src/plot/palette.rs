use plotters::style::RGBColor;

/// Qualitative 9-colour pastel palette
pub const PASTEL1: [RGBColor; 9] = [
    RGBColor(251, 180, 174),
    RGBColor(179, 205, 227),
    RGBColor(204, 235, 197),
    RGBColor(222, 203, 228),
    RGBColor(254, 217, 166),
    RGBColor(255, 255, 204),
    RGBColor(229, 216, 189),
    RGBColor(253, 218, 236),
    RGBColor(242, 242, 242),
];

/// Colour for a cluster label; labels past the palette reuse the last entry
pub fn pastel1(label: usize) -> RGBColor {
    PASTEL1[label.min(PASTEL1.len() - 1)]
}
