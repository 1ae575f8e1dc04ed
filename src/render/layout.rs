//! Depth-driven sizing for headings and inline text.
//!
//! Values come in three breakpoints: the base size, `gt_md` for medium
//! screens and up, and `gt_lg` for large screens.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Responsive<T> {
    pub base: T,
    pub gt_md: T,
    pub gt_lg: T,
}

impl<T: Copy> Responsive<T> {
    pub fn uniform(value: T) -> Self {
        Self {
            base: value,
            gt_md: value,
            gt_lg: value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub font_size: f64,
    pub line_height: f64,
}

impl FontMetrics {
    fn heading(size: f64) -> Self {
        Self {
            font_size: size,
            line_height: size * 1.2,
        }
    }
}

/// Top margin of a heading row.
///
/// The first child of a list gets no margin so it does not stack with the
/// spacing of whatever sits above it.
pub fn heading_margin(depth: usize, layout_unit: f64, is_first: bool) -> Responsive<f64> {
    if is_first {
        return Responsive::uniform(0.0);
    }
    let (base, gt_md, gt_lg) = match depth {
        1 => (1.3, 1.4, 1.5),
        2 => (1.2, 1.25, 1.3),
        3 => (1.0, 1.15, 1.2),
        _ => (1.0, 1.0, 1.0),
    };
    Responsive {
        base: layout_unit * base,
        gt_md: layout_unit * gt_md,
        gt_lg: layout_unit * gt_lg,
    }
}

/// Font size and line height of heading text.
pub fn heading_text(depth: usize, text_unit: f64) -> Responsive<FontMetrics> {
    let (base, gt_md, gt_lg) = match depth {
        1 => (1.6, 1.7, 1.8),
        2 => (1.4, 1.5, 1.6),
        3 => (1.2, 1.3, 1.4),
        _ => (1.0, 1.1, 1.2),
    };
    Responsive {
        base: FontMetrics::heading(text_unit * base),
        gt_md: FontMetrics::heading(text_unit * gt_md),
        gt_lg: FontMetrics::heading(text_unit * gt_lg),
    }
}

/// Paragraph text size. Line height stays at the base value on larger
/// screens.
pub fn inline_content_size(text_unit: f64) -> Responsive<FontMetrics> {
    let line_height = text_unit * 1.3;
    Responsive {
        base: FontMetrics {
            font_size: text_unit,
            line_height,
        },
        gt_md: FontMetrics {
            font_size: text_unit * 1.1,
            line_height,
        },
        gt_lg: FontMetrics {
            font_size: text_unit * 1.2,
            line_height,
        },
    }
}

/// CSS pixel length rounded to two decimals, without trailing zeros.
pub fn px(value: f64) -> String {
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}px")
}

impl Responsive<f64> {
    /// Inline style declaring `property` and its breakpoint variables.
    pub fn style(&self, property: &str) -> String {
        format!(
            "{property}:{};--{property}-md:{};--{property}-lg:{}",
            px(self.base),
            px(self.gt_md),
            px(self.gt_lg)
        )
    }
}

impl Responsive<FontMetrics> {
    pub fn style(&self) -> String {
        format!(
            "font-size:{};line-height:{};--font-size-md:{};--line-height-md:{};--font-size-lg:{};--line-height-lg:{}",
            px(self.base.font_size),
            px(self.base.line_height),
            px(self.gt_md.font_size),
            px(self.gt_md.line_height),
            px(self.gt_lg.font_size),
            px(self.gt_lg.line_height)
        )
    }
}
