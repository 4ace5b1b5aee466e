//! The fixed palette of cursor colours and the best-effort de-duplication
//! step applied when two remotes draw the same colour.

use crate::domain::identity::DisplayColor;

/// Cursor colours handed out to remotes, as `#rrggbb` hex strings.
///
/// All entries are CSS named colours that stay readable on a dark screen.
pub const PALETTE: &[&str] = &[
    "#e6e6fa", // lavender
    "#800080", // purple
    "#9370d8", // mediumpurple
    "#ff69b4", // hotpink
    "#ff1493", // deeppink
    "#db7093", // palevioletred
    "#ff7f50", // coral
    "#ff6347", // tomato
    "#ff4500", // orangered
    "#ffa500", // orange
    "#ffd700", // gold
    "#ffff00", // yellow
    "#f0e68c", // khaki
    "#adff2f", // greenyellow
    "#7fff00", // chartreuse
    "#32cd32", // limegreen
    "#00fa9a", // mediumspringgreen
    "#3cb371", // mediumseagreen
    "#20b2aa", // lightseagreen
    "#00ced1", // darkturquoise
    "#40e0d0", // turquoise
    "#7fffd4", // aquamarine
    "#00ffff", // cyan
    "#87ceeb", // skyblue
    "#00bfff", // deepskyblue
    "#1e90ff", // dodgerblue
    "#6495ed", // cornflowerblue
    "#4169e1", // royalblue
    "#7b68ee", // mediumslateblue
    "#8a2be2", // blueviolet
    "#9932cc", // darkorchid
    "#ba55d3", // mediumorchid
    "#da70d6", // orchid
    "#ee82ee", // violet
    "#dda0dd", // plum
    "#ff00ff", // magenta
    "#c71585", // mediumvioletred
    "#dc143c", // crimson
    "#fa8072", // salmon
    "#f4a460", // sandybrown
    "#d2691e", // chocolate
    "#cd853f", // peru
    "#bdb76b", // darkkhaki
    "#9acd32", // yellowgreen
    "#66cdaa", // mediumaquamarine
    "#b0c4de", // lightsteelblue
    "#f5f5f5", // whitesmoke
    "#ffdab9", // peachpuff
];

/// Returns a copy of `candidate` with the character at `position` replaced by
/// the decimal `digit`.
///
/// Used once when a freshly drawn colour matches a colour already in use, to
/// make a visible duplicate less likely.  It does not guarantee uniqueness:
/// the result is not checked again, and it may equal the input when the
/// replaced character already was `digit`.
///
/// Position 0 is the leading `#` and is never replaced; an out-of-range
/// position or a `digit` above 9 leaves the colour unchanged.
///
/// ```rust
/// use xyfi_core::domain::{best_effort_dedupe, DisplayColor};
///
/// let color = DisplayColor::new("#e6e6fa");
/// assert_eq!(best_effort_dedupe(&color, 1, 0).as_str(), "#06e6fa");
/// ```
pub fn best_effort_dedupe(candidate: &DisplayColor, position: usize, digit: u8) -> DisplayColor {
    let Some(replacement) = char::from_digit(u32::from(digit), 10) else {
        return candidate.clone();
    };
    if position == 0 || position >= candidate.as_str().chars().count() {
        return candidate.clone();
    }

    let perturbed: String = candidate
        .as_str()
        .chars()
        .enumerate()
        .map(|(i, c)| if i == position { replacement } else { c })
        .collect();
    DisplayColor::new(perturbed)
}
