//! Primary extraction path: walks each page's content stream with `lopdf`,
//! tracks the text matrix and rebuilds lines from run coordinates.
//!
//! Runs are concatenated in stream order. Multi-column or rotated pages may
//! therefore read out of visual order; no geometric sort is attempted.

use finrisk_models::{ExtractionMethod, PageText};
use finrisk_utils::{ExtractionConfig, FinRiskError, FinRiskResult};
use lopdf::content::{Content, Operation};
use lopdf::Object;
use tracing::debug;

use super::decode::decode_text_bytes;
use super::{ExtractionStrategy, PdfSource, Recovered};
use crate::progress::{ProgressEvent, ProgressSink};

const DEFAULT_FONT_SIZE: f64 = 12.0;
/// Estimated glyph advance as a fraction of the font size.
const GLYPH_WIDTH_EM: f64 = 0.5;
/// TJ adjustments (thousandths of an em) more negative than this read as a
/// word break.
const TJ_SPACE_THRESHOLD: f64 = -200.0;
/// Fraction of the font size above which a same-line gap separates words.
const WORD_GAP_EM: f64 = 0.25;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// One text-show operand placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub end_x: f64,
    pub font_size: f64,
    /// A TJ adjustment before this run signalled a word break.
    pub space_before: bool,
    pub text: String,
}

#[derive(Debug, Clone)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
    pending_space: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: DEFAULT_FONT_SIZE,
            leading: 0.0,
            pending_space: false,
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.matrix = IDENTITY;
        self.line_matrix = IDENTITY;
        self.pending_space = false;
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = translate(&self.line_matrix, tx, ty);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn set_matrix(&mut self, m: Matrix) {
        self.matrix = m;
        self.line_matrix = m;
    }

    fn effective_font_size(&self) -> f64 {
        let scale = self.matrix[0].hypot(self.matrix[1]);
        let scale = if scale > 0.0 { scale } else { 1.0 };
        (self.font_size * scale).abs()
    }

    fn show(&mut self, bytes: &[u8], runs: &mut Vec<TextRun>) {
        let text = decode_text_bytes(bytes);
        let glyphs = text.chars().count() as f64;
        let x = self.matrix[4];
        let y = self.matrix[5];
        let font_size = self.effective_font_size();

        self.matrix = translate(&self.matrix, glyphs * GLYPH_WIDTH_EM * self.font_size, 0.0);

        if !text.is_empty() {
            runs.push(TextRun {
                x,
                y,
                end_x: self.matrix[4],
                font_size,
                space_before: self.pending_space,
                text,
            });
            self.pending_space = false;
        }
    }

    fn adjust(&mut self, thousandths: f64) {
        if thousandths < TJ_SPACE_THRESHOLD {
            self.pending_space = true;
        }
        self.matrix = translate(&self.matrix, -thousandths / 1000.0 * self.font_size, 0.0);
    }
}

/// Applies a text-space translation to a matrix.
fn translate(m: &Matrix, tx: f64, ty: f64) -> Matrix {
    [
        m[0],
        m[1],
        m[2],
        m[3],
        tx * m[0] + ty * m[2] + m[4],
        tx * m[1] + ty * m[3] + m[5],
    ]
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Option<Vec<f64>> {
    operands.iter().map(number).collect()
}

fn string_bytes(object: &Object) -> Option<&[u8]> {
    match object {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

/// Collects positioned text runs from a decoded content stream.
pub fn collect_runs(operations: &[Operation]) -> Vec<TextRun> {
    let mut state = TextState::default();
    let mut runs = Vec::new();

    for op in operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "BT" => state.begin_text(),
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers(operands).as_deref() {
                    state.move_line(*tx, *ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers(operands).as_deref() {
                    state.leading = -*ty;
                    state.move_line(*tx, *ty);
                }
            }
            "Tm" => {
                if let Some([a, b, c, d, e, f]) = numbers(operands).as_deref() {
                    state.set_matrix([*a, *b, *c, *d, *e, *f]);
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    state.show(bytes, &mut runs);
                }
            }
            "'" => {
                state.next_line();
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    state.show(bytes, &mut runs);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(bytes) = operands.get(2).and_then(string_bytes) {
                    state.show(bytes, &mut runs);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        if let Some(bytes) = string_bytes(item) {
                            state.show(bytes, &mut runs);
                        } else if let Some(adjustment) = number(item) {
                            state.adjust(adjustment);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    runs
}

/// Joins runs into page text: a vertical jump beyond `line_tolerance`
/// starts a new line, a same-line jump beyond `column_gap` (either way)
/// becomes one space.
pub fn assemble_runs(runs: &[TextRun], line_tolerance: f64, column_gap: f64) -> String {
    let mut text = String::new();
    let mut previous: Option<&TextRun> = None;

    for run in runs {
        if let Some(prev) = previous {
            if (run.y - prev.y).abs() > line_tolerance {
                text.push('\n');
            } else {
                let gap = run.x - prev.end_x;
                let word_break = run.space_before || gap > run.font_size * WORD_GAP_EM;
                let needs_space = gap.abs() > column_gap || word_break;
                if needs_space && !ends_with_space(&text) && !run.text.starts_with(' ') {
                    text.push(' ');
                }
            }
        }
        text.push_str(&run.text);
        previous = Some(run);
    }

    text
}

fn ends_with_space(text: &str) -> bool {
    text.chars().last().map_or(true, char::is_whitespace)
}

#[derive(Debug, Clone)]
pub struct PositionedTextStrategy {
    line_tolerance: f64,
    column_gap: f64,
}

impl PositionedTextStrategy {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            line_tolerance: config.line_tolerance,
            column_gap: config.column_gap,
        }
    }
}

impl ExtractionStrategy for PositionedTextStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::PositionedText
    }

    fn quality_gated(&self) -> bool {
        true
    }

    fn extract(
        &self,
        source: &PdfSource<'_>,
        progress: &dyn ProgressSink,
    ) -> FinRiskResult<Option<Recovered>> {
        let Some(document) = source.document.as_ref() else {
            return Ok(None);
        };

        let mut pages = Vec::new();
        for (page_number, page_id) in document.get_pages() {
            if progress.is_cancelled() {
                return Err(FinRiskError::cancelled("extraction"));
            }

            let content = match document
                .get_page_content(page_id)
                .and_then(|bytes| Content::decode(&bytes))
            {
                Ok(content) => content,
                Err(e) => {
                    debug!(page_number, error = %e, "Skipping unreadable page content");
                    continue;
                }
            };

            let runs = collect_runs(&content.operations);
            let text = assemble_runs(&runs, self.line_tolerance, self.column_gap);
            progress.on_event(&ProgressEvent::PageExtracted {
                method: self.method(),
                page_number,
                page_count: source.page_count,
            });
            if !text.trim().is_empty() {
                pages.push(PageText::new(page_number, text));
            }
        }

        if pages.is_empty() {
            return Ok(None);
        }
        Ok(Some(Recovered::Pages(pages)))
    }
}
