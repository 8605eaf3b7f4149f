use std::ops::Range;

use gpui::{
    App, Bounds, ClipboardItem, Context, CursorStyle, ElementId, ElementInputHandler, Entity,
    EntityInputHandler, EventEmitter, FocusHandle, Focusable, GlobalElementId, LayoutId,
    MouseButton, MouseDownEvent, MouseMoveEvent, MouseUpEvent, PaintQuad, Pixels, Point,
    ShapedLine, SharedString, Style, TextAlign, TextRun, UTF16Selection, Window, actions, div,
    fill, point, prelude::*, px, relative, rgb, rgba,
};
use unicode_segmentation::UnicodeSegmentation;

use crate::theme::*;

actions!(
    text_input,
    [
        Backspace,
        Delete,
        Left,
        Right,
        SelectLeft,
        SelectRight,
        SelectAll,
        Home,
        End,
        ShowCharacterPalette,
        Paste,
        Cut,
        Copy,
    ]
);

const MASK: char = '•';

/// Emitted after the user changes the text. `set_text` stays silent.
pub struct Edited;

/// Single-line field. Masked fields render one bullet per grapheme.
pub struct TextInput {
    focus_handle: FocusHandle,
    text: SharedString,
    placeholder: SharedString,
    selection: Range<usize>,
    reversed: bool,
    marked: Option<Range<usize>>,
    layout: Option<ShapedLine>,
    bounds: Option<Bounds<Pixels>>,
    dragging: bool,
    masked: bool,
    pub disabled: bool,
}

impl EventEmitter<Edited> for TextInput {}

impl TextInput {
    pub fn new(context: &mut App, placeholder: &str, masked: bool) -> Entity<Self> {
        let placeholder = SharedString::from(placeholder.to_string());
        context.new(|context| Self {
            focus_handle: context.focus_handle(),
            text: SharedString::default(),
            placeholder,
            selection: 0..0,
            reversed: false,
            marked: None,
            layout: None,
            bounds: None,
            dragging: false,
            masked,
            disabled: false,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str, context: &mut Context<Self>) {
        if &*self.text == text {
            return;
        }
        self.text = SharedString::from(text.to_string());
        self.selection = text.len()..text.len();
        self.reversed = false;
        self.marked = None;
        context.notify();
    }

    fn caret(&self) -> usize {
        if self.reversed {
            self.selection.start
        } else {
            self.selection.end
        }
    }

    fn collapse_to(&mut self, offset: usize, context: &mut Context<Self>) {
        self.selection = offset..offset;
        self.reversed = false;
        context.notify();
    }

    fn extend_to(&mut self, offset: usize, context: &mut Context<Self>) {
        if self.reversed {
            self.selection.start = offset;
        } else {
            self.selection.end = offset;
        }
        if self.selection.start > self.selection.end {
            self.selection = self.selection.end..self.selection.start;
            self.reversed = !self.reversed;
        }
        context.notify();
    }

    fn grapheme_before(&self, offset: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .map(|(index, _)| index)
            .take_while(|index| *index < offset)
            .last()
            .unwrap_or(0)
    }

    fn grapheme_after(&self, offset: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .map(|(index, _)| index)
            .find(|index| *index > offset)
            .unwrap_or(self.text.len())
    }

    /// Maps a text offset to the rendered line, which differs when masked.
    fn shown_offset(&self, offset: usize) -> usize {
        if self.masked {
            self.text[..offset].graphemes(true).count() * MASK.len_utf8()
        } else {
            offset
        }
    }

    fn text_offset(&self, shown: usize) -> usize {
        if !self.masked {
            return shown;
        }
        self.text
            .grapheme_indices(true)
            .nth(shown / MASK.len_utf8())
            .map_or(self.text.len(), |(index, _)| index)
    }

    fn to_utf16(&self, offset: usize) -> usize {
        self.text[..offset].encode_utf16().count()
    }

    fn from_utf16(&self, offset: usize) -> usize {
        let mut units = 0;
        for (index, character) in self.text.char_indices() {
            if units >= offset {
                return index;
            }
            units += character.len_utf16();
        }
        self.text.len()
    }

    fn range_to_utf16(&self, range: &Range<usize>) -> Range<usize> {
        self.to_utf16(range.start)..self.to_utf16(range.end)
    }

    fn range_from_utf16(&self, range: &Range<usize>) -> Range<usize> {
        self.from_utf16(range.start)..self.from_utf16(range.end)
    }

    fn offset_at(&self, position: Point<Pixels>) -> usize {
        let (Some(bounds), Some(layout)) = (self.bounds.as_ref(), self.layout.as_ref()) else {
            return 0;
        };
        if self.text.is_empty() || position.y < bounds.top() {
            return 0;
        }
        if position.y > bounds.bottom() {
            return self.text.len();
        }
        self.text_offset(layout.closest_index_for_x(position.x - bounds.left()))
    }

    fn selected_text(&self) -> Option<String> {
        (!self.selection.is_empty()).then(|| self.text[self.selection.clone()].to_string())
    }

    fn splice(&mut self, range: Range<usize>, inserted: &str) {
        let mut text = String::with_capacity(self.text.len() + inserted.len());
        text.push_str(&self.text[..range.start]);
        text.push_str(inserted);
        text.push_str(&self.text[range.end..]);
        self.text = text.into();
    }

    fn left(&mut self, _: &Left, _: &mut Window, context: &mut Context<Self>) {
        let target = if self.selection.is_empty() {
            self.grapheme_before(self.caret())
        } else {
            self.selection.start
        };
        self.collapse_to(target, context);
    }

    fn right(&mut self, _: &Right, _: &mut Window, context: &mut Context<Self>) {
        let target = if self.selection.is_empty() {
            self.grapheme_after(self.caret())
        } else {
            self.selection.end
        };
        self.collapse_to(target, context);
    }

    fn select_left(&mut self, _: &SelectLeft, _: &mut Window, context: &mut Context<Self>) {
        self.extend_to(self.grapheme_before(self.caret()), context);
    }

    fn select_right(&mut self, _: &SelectRight, _: &mut Window, context: &mut Context<Self>) {
        self.extend_to(self.grapheme_after(self.caret()), context);
    }

    fn select_all(&mut self, _: &SelectAll, _: &mut Window, context: &mut Context<Self>) {
        self.selection = 0..self.text.len();
        self.reversed = false;
        context.notify();
    }

    fn home(&mut self, _: &Home, _: &mut Window, context: &mut Context<Self>) {
        self.collapse_to(0, context);
    }

    fn end(&mut self, _: &End, _: &mut Window, context: &mut Context<Self>) {
        self.collapse_to(self.text.len(), context);
    }

    fn backspace(&mut self, _: &Backspace, window: &mut Window, context: &mut Context<Self>) {
        if self.disabled {
            return;
        }
        if self.selection.is_empty() {
            self.extend_to(self.grapheme_before(self.caret()), context);
        }
        self.replace_text_in_range(None, "", window, context);
    }

    fn delete(&mut self, _: &Delete, window: &mut Window, context: &mut Context<Self>) {
        if self.disabled {
            return;
        }
        if self.selection.is_empty() {
            self.extend_to(self.grapheme_after(self.caret()), context);
        }
        self.replace_text_in_range(None, "", window, context);
    }

    fn paste(&mut self, _: &Paste, window: &mut Window, context: &mut Context<Self>) {
        if self.disabled {
            return;
        }
        if let Some(text) = context.read_from_clipboard().and_then(|item| item.text()) {
            self.replace_text_in_range(None, &text, window, context);
        }
    }

    fn copy(&mut self, _: &Copy, _: &mut Window, context: &mut Context<Self>) {
        if self.masked {
            return;
        }
        if let Some(text) = self.selected_text() {
            context.write_to_clipboard(ClipboardItem::new_string(text));
        }
    }

    fn cut(&mut self, _: &Cut, window: &mut Window, context: &mut Context<Self>) {
        if self.disabled || self.masked {
            return;
        }
        if let Some(text) = self.selected_text() {
            context.write_to_clipboard(ClipboardItem::new_string(text));
            self.replace_text_in_range(None, "", window, context);
        }
    }

    fn show_character_palette(
        &mut self,
        _: &ShowCharacterPalette,
        window: &mut Window,
        _: &mut Context<Self>,
    ) {
        window.show_character_palette();
    }

    fn on_mouse_down(
        &mut self,
        event: &MouseDownEvent,
        _: &mut Window,
        context: &mut Context<Self>,
    ) {
        self.dragging = true;
        let offset = self.offset_at(event.position);
        if event.modifiers.shift {
            self.extend_to(offset, context);
        } else {
            self.collapse_to(offset, context);
        }
    }

    fn on_mouse_up(&mut self, _: &MouseUpEvent, _: &mut Window, _: &mut Context<Self>) {
        self.dragging = false;
    }

    fn on_mouse_move(&mut self, event: &MouseMoveEvent, _: &mut Window, context: &mut Context<Self>) {
        if self.dragging {
            self.extend_to(self.offset_at(event.position), context);
        }
    }
}

impl EntityInputHandler for TextInput {
    fn text_for_range(
        &mut self,
        range_utf16: Range<usize>,
        actual_range: &mut Option<Range<usize>>,
        _window: &mut Window,
        _context: &mut Context<Self>,
    ) -> Option<String> {
        let range = self.range_from_utf16(&range_utf16);
        actual_range.replace(self.range_to_utf16(&range));
        Some(self.text[range].to_string())
    }

    fn selected_text_range(
        &mut self,
        _ignore_disabled_input: bool,
        _window: &mut Window,
        _context: &mut Context<Self>,
    ) -> Option<UTF16Selection> {
        Some(UTF16Selection {
            range: self.range_to_utf16(&self.selection),
            reversed: self.reversed,
        })
    }

    fn marked_text_range(
        &self,
        _window: &mut Window,
        _context: &mut Context<Self>,
    ) -> Option<Range<usize>> {
        self.marked.as_ref().map(|range| self.range_to_utf16(range))
    }

    fn unmark_text(&mut self, _window: &mut Window, _context: &mut Context<Self>) {
        self.marked = None;
    }

    fn replace_text_in_range(
        &mut self,
        range_utf16: Option<Range<usize>>,
        new_text: &str,
        _: &mut Window,
        context: &mut Context<Self>,
    ) {
        if self.disabled {
            return;
        }
        let range = range_utf16
            .map(|range| self.range_from_utf16(&range))
            .or_else(|| self.marked.clone())
            .unwrap_or_else(|| self.selection.clone());
        let inserted: String = new_text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();

        self.splice(range.clone(), &inserted);
        let caret = range.start + inserted.len();
        self.selection = caret..caret;
        self.reversed = false;
        self.marked = None;
        context.emit(Edited);
        context.notify();
    }

    fn replace_and_mark_text_in_range(
        &mut self,
        range_utf16: Option<Range<usize>>,
        new_text: &str,
        new_selected_range_utf16: Option<Range<usize>>,
        _window: &mut Window,
        context: &mut Context<Self>,
    ) {
        if self.disabled {
            return;
        }
        let range = range_utf16
            .map(|range| self.range_from_utf16(&range))
            .or_else(|| self.marked.clone())
            .unwrap_or_else(|| self.selection.clone());

        self.splice(range.clone(), new_text);
        self.marked = (!new_text.is_empty()).then(|| range.start..range.start + new_text.len());
        self.selection = new_selected_range_utf16
            .map(|selected| self.range_from_utf16(&selected))
            .map(|selected| range.start + selected.start..range.start + selected.end)
            .unwrap_or_else(|| {
                let caret = range.start + new_text.len();
                caret..caret
            });
        context.emit(Edited);
        context.notify();
    }

    fn bounds_for_range(
        &mut self,
        range_utf16: Range<usize>,
        bounds: Bounds<Pixels>,
        _window: &mut Window,
        _context: &mut Context<Self>,
    ) -> Option<Bounds<Pixels>> {
        let layout = self.layout.as_ref()?;
        let range = self.range_from_utf16(&range_utf16);
        let start = layout.x_for_index(self.shown_offset(range.start));
        let end = layout.x_for_index(self.shown_offset(range.end));
        Some(Bounds::from_corners(
            point(bounds.left() + start, bounds.top()),
            point(bounds.left() + end, bounds.bottom()),
        ))
    }

    fn character_index_for_point(
        &mut self,
        position: Point<Pixels>,
        _window: &mut Window,
        _context: &mut Context<Self>,
    ) -> Option<usize> {
        let local = self.bounds?.localize(&position)?;
        let layout = self.layout.as_ref()?;
        let shown = layout.index_for_x(position.x - local.x)?;
        Some(self.to_utf16(self.text_offset(shown)))
    }
}

struct TextElement {
    input: Entity<TextInput>,
}

struct PrepaintState {
    line: Option<ShapedLine>,
    caret: Option<PaintQuad>,
    highlight: Option<PaintQuad>,
}

impl IntoElement for TextElement {
    type Element = Self;

    fn into_element(self) -> Self::Element {
        self
    }
}

impl Element for TextElement {
    type RequestLayoutState = ();
    type PrepaintState = PrepaintState;

    fn id(&self) -> Option<ElementId> {
        None
    }

    fn source_location(&self) -> Option<&'static core::panic::Location<'static>> {
        None
    }

    fn request_layout(
        &mut self,
        _id: Option<&GlobalElementId>,
        _inspector_id: Option<&gpui::InspectorElementId>,
        window: &mut Window,
        context: &mut App,
    ) -> (LayoutId, Self::RequestLayoutState) {
        let mut style = Style::default();
        style.size.width = relative(1.).into();
        style.size.height = window.line_height().into();
        (window.request_layout(style, [], context), ())
    }

    fn prepaint(
        &mut self,
        _id: Option<&GlobalElementId>,
        _inspector_id: Option<&gpui::InspectorElementId>,
        bounds: Bounds<Pixels>,
        _request_layout: &mut Self::RequestLayoutState,
        window: &mut Window,
        context: &mut App,
    ) -> Self::PrepaintState {
        let input = self.input.read(context);
        let style = window.text_style();

        let (shown, color) = if input.text.is_empty() {
            (input.placeholder.clone(), rgba(INPUT_PLACEHOLDER).into())
        } else if input.masked {
            let bullets: String = input.text.graphemes(true).map(|_| MASK).collect();
            (SharedString::from(bullets), style.color)
        } else {
            (input.text.clone(), style.color)
        };

        let base = TextRun {
            len: shown.len(),
            font: style.font(),
            color,
            background_color: None,
            underline: None,
            strikethrough: None,
        };
        let runs = match input.marked.as_ref() {
            Some(marked) if !input.masked && !input.text.is_empty() => [
                TextRun {
                    len: marked.start,
                    ..base.clone()
                },
                TextRun {
                    len: marked.len(),
                    underline: Some(gpui::UnderlineStyle {
                        color: Some(base.color),
                        thickness: px(1.0),
                        wavy: false,
                    }),
                    ..base.clone()
                },
                TextRun {
                    len: shown.len() - marked.end,
                    ..base
                },
            ]
            .into_iter()
            .filter(|run| run.len > 0)
            .collect(),
            _ => vec![base],
        };

        let font_size = style.font_size.to_pixels(window.rem_size());
        let line = window
            .text_system()
            .shape_line(shown, font_size, &runs, None);

        let height = bounds.bottom() - bounds.top();
        let (caret, highlight) = if input.selection.is_empty() {
            let x = line.x_for_index(input.shown_offset(input.caret()));
            let caret = fill(
                Bounds::new(
                    point(bounds.left() + x, bounds.top()),
                    gpui::size(px(CURSOR_WIDTH), height),
                ),
                rgb(BORDER_FOCUS),
            );
            (Some(caret), None)
        } else {
            let start = line.x_for_index(input.shown_offset(input.selection.start));
            let end = line.x_for_index(input.shown_offset(input.selection.end));
            let highlight = fill(
                Bounds::from_corners(
                    point(bounds.left() + start, bounds.top()),
                    point(bounds.left() + end, bounds.bottom()),
                ),
                rgba(SELECTION),
            );
            (None, Some(highlight))
        };

        PrepaintState {
            line: Some(line),
            caret,
            highlight,
        }
    }

    fn paint(
        &mut self,
        _id: Option<&GlobalElementId>,
        _inspector_id: Option<&gpui::InspectorElementId>,
        bounds: Bounds<Pixels>,
        _request_layout: &mut Self::RequestLayoutState,
        prepaint: &mut Self::PrepaintState,
        window: &mut Window,
        context: &mut App,
    ) {
        let focus_handle = self.input.read(context).focus_handle.clone();
        window.handle_input(
            &focus_handle,
            ElementInputHandler::new(bounds, self.input.clone()),
            context,
        );
        if let Some(highlight) = prepaint.highlight.take() {
            window.paint_quad(highlight);
        }
        let Some(line) = prepaint.line.take() else {
            return;
        };
        if let Err(error) = line.paint(
            bounds.origin,
            window.line_height(),
            TextAlign::Left,
            None,
            window,
            context,
        ) {
            log::warn!("[text_input] paint failed: {error}");
        }
        if focus_handle.is_focused(window)
            && let Some(caret) = prepaint.caret.take()
        {
            window.paint_quad(caret);
        }
        self.input.update(context, |input, _| {
            input.layout = Some(line);
            input.bounds = Some(bounds);
        });
    }
}

impl Render for TextInput {
    fn render(&mut self, window: &mut Window, context: &mut Context<Self>) -> impl IntoElement {
        let disabled = self.disabled;
        let focused = !disabled && self.focus_handle.is_focused(window);

        div()
            .flex()
            .key_context("TextInput")
            .when(!disabled, |element| {
                element
                    .track_focus(&self.focus_handle(context))
                    .cursor(CursorStyle::IBeam)
                    .on_mouse_down(MouseButton::Left, context.listener(Self::on_mouse_down))
                    .on_mouse_up(MouseButton::Left, context.listener(Self::on_mouse_up))
                    .on_mouse_up_out(MouseButton::Left, context.listener(Self::on_mouse_up))
                    .on_mouse_move(context.listener(Self::on_mouse_move))
            })
            .on_action(context.listener(Self::backspace))
            .on_action(context.listener(Self::delete))
            .on_action(context.listener(Self::left))
            .on_action(context.listener(Self::right))
            .on_action(context.listener(Self::select_left))
            .on_action(context.listener(Self::select_right))
            .on_action(context.listener(Self::select_all))
            .on_action(context.listener(Self::home))
            .on_action(context.listener(Self::end))
            .on_action(context.listener(Self::show_character_palette))
            .on_action(context.listener(Self::paste))
            .on_action(context.listener(Self::cut))
            .on_action(context.listener(Self::copy))
            .text_color(rgb(if disabled { TEXT_DIM } else { TEXT_PRIMARY }))
            .text_size(px(TEXT_SIZE_MEDIUM))
            .line_height(px(LINE_HEIGHT_MEDIUM))
            .child(
                div()
                    .h(px(ELEMENT_HEIGHT))
                    .w_full()
                    .px(px(PADDING_INPUT_HORIZONTAL))
                    .py(px(PADDING_INPUT_VERTICAL))
                    .bg(rgb(INPUT_BACKGROUND))
                    .border_1()
                    .border_color(rgb(if focused { BORDER_FOCUS } else { BORDER }))
                    .rounded(px(RADIUS))
                    .child(TextElement {
                        input: context.entity().clone(),
                    }),
            )
    }
}

impl Focusable for TextInput {
    fn focus_handle(&self, _: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}
