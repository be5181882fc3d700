//! Minimal layout for `$...$` formula strings.
//!
//! Supported markup: `^` and `_` scripts taking one character or a braced
//! group, and `\name` commands for Greek letters and a few operators. The
//! result is a list of runs with their scale and baseline offset.

/// Size multiplier per script level.
const SCRIPT_SCALE: f32 = 0.7;
/// Baseline raise of a superscript, in units of the parent size.
const SUP_RAISE: f32 = 0.45;
/// Baseline drop of a subscript, in units of the parent size.
const SUB_DROP: f32 = 0.2;
/// Inset around the rendered formula image, in pixels.
pub const FORMULA_INSET: f32 = 5.0;

/// A piece of text at one script level.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    /// Positive for superscripts, negative for subscripts.
    pub level: i32,
}

/// A positioned run.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidRun {
    pub text: String,
    /// Pixel size of the glyphs.
    pub size: f32,
    /// Left edge relative to the layout origin.
    pub x: f32,
    /// Baseline raise above the main baseline.
    pub rise: f32,
}

/// Layout of a formula, measured from the main baseline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormulaLayout {
    pub runs: Vec<LaidRun>,
    pub width: f32,
    /// Extent above the main baseline.
    pub ascent: f32,
    /// Extent below the main baseline, positive.
    pub descent: f32,
}

impl FormulaLayout {
    /// Box size including the insets.
    #[must_use]
    pub fn padded_size(&self) -> (f32, f32) {
        (
            self.width + 2.0 * FORMULA_INSET,
            self.ascent + self.descent + 2.0 * FORMULA_INSET,
        )
    }
}

/// Unicode replacement for a `\name` command.
#[must_use]
pub fn symbol(name: &str) -> Option<char> {
    let c = match name {
        "alpha" => 'α',
        "beta" => 'β',
        "gamma" => 'γ',
        "delta" => 'δ',
        "epsilon" => 'ε',
        "zeta" => 'ζ',
        "eta" => 'η',
        "theta" => 'θ',
        "kappa" => 'κ',
        "lambda" => 'λ',
        "mu" => 'μ',
        "nu" => 'ν',
        "xi" => 'ξ',
        "pi" => 'π',
        "rho" => 'ρ',
        "sigma" => 'σ',
        "tau" => 'τ',
        "phi" => 'φ',
        "chi" => 'χ',
        "psi" => 'ψ',
        "omega" => 'ω',
        "Gamma" => 'Γ',
        "Delta" => 'Δ',
        "Theta" => 'Θ',
        "Lambda" => 'Λ',
        "Pi" => 'Π',
        "Sigma" => 'Σ',
        "Phi" => 'Φ',
        "Psi" => 'Ψ',
        "Omega" => 'Ω',
        "circ" | "degree" => '°',
        "times" => '×',
        "cdot" => '·',
        "pm" => '±',
        "leq" | "le" => '≤',
        "geq" | "ge" => '≥',
        "neq" | "ne" => '≠',
        "approx" => '≈',
        "infty" => '∞',
        "partial" => '∂',
        "nabla" => '∇',
        "sum" => '∑',
        "int" => '∫',
        "sqrt" => '√',
        "rightarrow" | "to" => '→',
        "," | ";" | " " => ' ',
        _ => return None,
    };
    Some(c)
}

/// Strips the `$` delimiters of a formula string.
#[must_use]
pub fn body(text: &str) -> &str {
    let t = text.trim();
    t.strip_prefix('$')
        .and_then(|t| t.strip_suffix('$'))
        .unwrap_or(t)
}

/// Splits a formula body into runs.
#[must_use]
pub fn parse(body: &str) -> Vec<Run> {
    let chars: Vec<char> = body.chars().collect();
    let mut runs = Vec::new();
    parse_group(&chars, &mut 0, 0, &mut runs, false);
    runs
}

fn push_text(runs: &mut Vec<Run>, level: i32, s: &str) {
    match runs.last_mut() {
        Some(last) if last.level == level => last.text.push_str(s),
        _ => runs.push(Run {
            text: s.to_string(),
            level,
        }),
    }
}

fn parse_command(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    if *pos < chars.len() && !chars[*pos].is_ascii_alphabetic() {
        *pos += 1;
    } else {
        while *pos < chars.len() && chars[*pos].is_ascii_alphabetic() {
            *pos += 1;
        }
    }
    let name: String = chars[start..*pos].iter().collect();
    symbol(&name).map_or(name, String::from)
}

fn parse_group(chars: &[char], pos: &mut usize, level: i32, runs: &mut Vec<Run>, braced: bool) {
    while *pos < chars.len() {
        let c = chars[*pos];
        *pos += 1;
        match c {
            '}' if braced => return,
            '{' => parse_group(chars, pos, level, runs, true),
            '\\' => {
                let s = parse_command(chars, pos);
                push_text(runs, level, &s);
            }
            '^' | '_' => {
                let inner = if c == '^' { level + 1 } else { level - 1 };
                parse_script(chars, pos, inner, runs);
            }
            _ => {
                let mut buf = [0u8; 4];
                push_text(runs, level, c.encode_utf8(&mut buf));
            }
        }
    }
}

fn parse_script(chars: &[char], pos: &mut usize, level: i32, runs: &mut Vec<Run>) {
    match chars.get(*pos) {
        Some('{') => {
            *pos += 1;
            parse_group(chars, pos, level, runs, true);
        }
        Some('\\') => {
            *pos += 1;
            let s = parse_command(chars, pos);
            push_text(runs, level, &s);
        }
        Some(c) => {
            *pos += 1;
            let mut buf = [0u8; 4];
            push_text(runs, level, c.encode_utf8(&mut buf));
        }
        None => {}
    }
}

/// Positions runs given a function measuring `(text, pixel size)` widths.
///
/// `ascent` and `descent` are the font's per-pixel-size line metrics.
pub fn layout(
    runs: &[Run],
    size: f32,
    ascent: f32,
    descent: f32,
    mut advance: impl FnMut(&str, f32) -> f32,
) -> FormulaLayout {
    let mut out = FormulaLayout::default();
    let mut x = 0.0;
    for run in runs {
        let (run_size, rise) = level_metrics(run.level, size);
        let w = advance(&run.text, run_size);
        out.ascent = out.ascent.max(rise + ascent * run_size);
        out.descent = out.descent.max(descent * run_size - rise);
        out.runs.push(LaidRun {
            text: run.text.clone(),
            size: run_size,
            x,
            rise,
        });
        x += w;
    }
    out.width = x;
    out
}

/// Glyph size and baseline raise of a script level.
fn level_metrics(level: i32, size: f32) -> (f32, f32) {
    let mut s = size;
    let mut rise = 0.0;
    for _ in 0..level.unsigned_abs() {
        rise += if level > 0 { SUP_RAISE * s } else { -SUB_DROP * s };
        s *= SCRIPT_SCALE;
    }
    (s, rise)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scripts_and_symbols() {
        let runs = parse("T_{s}+\\alpha^2");
        assert_eq!(
            runs,
            vec![
                Run { text: "T".into(), level: 0 },
                Run { text: "s".into(), level: -1 },
                Run { text: "+α".into(), level: 0 },
                Run { text: "2".into(), level: 1 },
            ]
        );
    }

    #[test]
    fn test_unknown_command_kept_as_text() {
        let runs = parse("\\foo x");
        assert_eq!(runs[0].text, "foo x");
    }

    #[test]
    fn test_body_strips_delimiters() {
        assert_eq!(body(" $x^2$ "), "x^2");
        assert_eq!(body("plain"), "plain");
    }

    #[test]
    fn test_layout_raises_superscripts() {
        let runs = parse("x^2");
        let l = layout(&runs, 10.0, 0.8, 0.2, |s, px| s.chars().count() as f32 * px * 0.5);
        assert_eq!(l.runs.len(), 2);
        assert!((l.runs[1].size - 7.0).abs() < 1e-5);
        assert!((l.runs[1].rise - 4.5).abs() < 1e-5);
        assert!((l.width - (5.0 + 3.5)).abs() < 1e-5);
        assert!(l.ascent > 8.0);
        let (w, h) = l.padded_size();
        assert!((w - l.width - 10.0).abs() < 1e-5);
        assert!((h - l.ascent - l.descent - 10.0).abs() < 1e-5);
    }
}
