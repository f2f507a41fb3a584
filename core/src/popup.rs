// Popup Controller
// Tracks which action button the reader is offered for the current
// selection and runs that action against the document.

use log::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::law::LawDocument;
use crate::render::Renderer;
use crate::selection::{Rect, Resolution, SelectionSurface, resolve};
use crate::span::Span;
use crate::text_run::ContainerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    Hidden,
    ShowingApply {
        rect: Rect,
    },
    ShowingRemove {
        rect: Rect,
    },
}

impl PopupState {
    pub fn rect(&self) -> Option<Rect> {
        match self {
            PopupState::Hidden => None,
            PopupState::ShowingApply { rect } | PopupState::ShowingRemove { rect } => Some(*rect),
        }
    }

    /// Button caption
    pub fn label(&self) -> Option<&'static str> {
        match self {
            PopupState::Hidden => None,
            PopupState::ShowingApply { .. } => Some("Highlight"),
            PopupState::ShowingRemove { .. } => Some("Remove highlight"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Apply,
    Remove,
}

#[derive(Debug, Default)]
pub struct PopupController {
    state: PopupState,
    pending: Option<Span>,
    coalesce_runs: bool,
}

impl PopupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &Config) -> Self {
        PopupController {
            coalesce_runs: config.coalesce_runs,
            ..Self::default()
        }
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    /// Span the offered action would act on
    pub fn pending(&self) -> Option<Span> {
        self.pending
    }

    fn hide(&mut self) {
        self.state = PopupState::Hidden;
        self.pending = None;
    }

    /// Re-read the surface's selection and choose the action to offer.
    pub fn on_selection_changed(
        &mut self,
        document: &LawDocument,
        surface: &dyn SelectionSurface,
    ) -> PopupState {
        match resolve(document, surface.selection().as_ref()) {
            Ok(Resolution::NoSelection) => self.hide(),
            Ok(Resolution::Resolved(selection)) => {
                self.pending = Some(selection.span);
                let rect = selection.anchor_rect;
                self.state = if selection.overlaps_highlight {
                    PopupState::ShowingRemove { rect }
                } else {
                    PopupState::ShowingApply { rect }
                };
            }
            Err(err) => {
                warn!("ignoring selection: {err}");
                self.hide();
            }
        }
        debug!("popup: {:?}", self.state);
        self.state
    }

    /// Highlight the pending selection.
    ///
    /// Returns the article that changed, or `None` if nothing was selected.
    pub fn apply(
        &mut self,
        document: &mut LawDocument,
        surface: &mut dyn SelectionSurface,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<ContainerId>> {
        self.run(Action::Apply, document, surface, renderer)
    }

    /// Remove highlighting from the pending selection.
    pub fn remove(
        &mut self,
        document: &mut LawDocument,
        surface: &mut dyn SelectionSurface,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<ContainerId>> {
        self.run(Action::Remove, document, surface, renderer)
    }

    /// Run whichever action is currently offered.
    pub fn invoke(
        &mut self,
        document: &mut LawDocument,
        surface: &mut dyn SelectionSurface,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<ContainerId>> {
        match self.state {
            PopupState::Hidden => Ok(None),
            PopupState::ShowingApply { .. } => self.apply(document, surface, renderer),
            PopupState::ShowingRemove { .. } => self.remove(document, surface, renderer),
        }
    }

    fn run(
        &mut self,
        action: Action,
        document: &mut LawDocument,
        surface: &mut dyn SelectionSurface,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<ContainerId>> {
        let Some(span) = self.pending else {
            return Ok(None);
        };
        self.hide();

        let changed = match action {
            Action::Apply => document.apply_highlight(&span),
            Action::Remove => document.remove_highlight(&span),
        };
        let id = match changed {
            Ok(id) => id,
            Err(err) => {
                warn!("{action:?} rejected: {err}");
                return Err(err);
            }
        };

        let container = document.container_mut(id)?;
        if self.coalesce_runs {
            container.coalesce();
        }
        surface.clear_selection();
        renderer.render(container);
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HighlightError;
    use crate::render::MarkupRenderer;
    use crate::selection::{NativeSelection, SelectionBuffer};
    use crate::span::BoundaryPoint;

    struct Fixture {
        document: LawDocument,
        surface: SelectionBuffer,
        renderer: MarkupRenderer,
        popup: PopupController,
    }

    impl Fixture {
        fn new(popup: PopupController) -> Self {
            Fixture {
                document: LawDocument::from_texts("test", ["ABCDEFGH", "VWXYZ"]),
                surface: SelectionBuffer::new(),
                renderer: MarkupRenderer::default(),
                popup,
            }
        }

        fn select(&mut self, container: u32, start: usize, end: usize) -> PopupState {
            let span = self
                .document
                .container(ContainerId(container))
                .unwrap()
                .span_between(start..end)
                .unwrap();
            self.surface.select(NativeSelection {
                anchor: span.start,
                focus: span.end,
                rect: Rect::new(start as i32, 0, (end - start) as i32, 1),
            });
            self.popup.on_selection_changed(&self.document, &self.surface)
        }

        fn invoke(&mut self) -> Result<Option<ContainerId>> {
            self.popup
                .invoke(&mut self.document, &mut self.surface, &mut self.renderer)
        }

        fn markup(&self, container: u32) -> String {
            self.renderer
                .markup(self.document.container(ContainerId(container)).unwrap())
        }
    }

    #[test]
    fn test_initially_hidden() {
        let popup = PopupController::new();
        assert_eq!(popup.state(), PopupState::Hidden);
        assert_eq!(popup.state().label(), None);
    }

    #[test]
    fn test_plain_selection_offers_apply() {
        let mut fx = Fixture::new(PopupController::new());
        let state = fx.select(0, 1, 4);
        assert_eq!(
            state,
            PopupState::ShowingApply {
                rect: Rect::new(1, 0, 3, 1)
            }
        );
        assert_eq!(state.label(), Some("Highlight"));
    }

    #[test]
    fn test_apply_then_remove_cycle() {
        let mut fx = Fixture::new(PopupController::new());
        fx.select(0, 1, 4);
        assert_eq!(fx.invoke(), Ok(Some(ContainerId(0))));

        assert_eq!(fx.popup.state(), PopupState::Hidden);
        assert!(fx.surface.selection().is_none());
        assert_eq!(fx.renderer.output(ContainerId(0)), Some("A[[BCD]]EFGH"));

        let state = fx.select(0, 2, 3);
        assert!(matches!(state, PopupState::ShowingRemove { .. }));
        assert_eq!(fx.invoke(), Ok(Some(ContainerId(0))));
        assert_eq!(fx.markup(0), "A[[B]]C[[D]]EFGH");
        assert_eq!(fx.popup.state(), PopupState::Hidden);
    }

    #[test]
    fn test_clearing_selection_hides() {
        let mut fx = Fixture::new(PopupController::new());
        fx.select(0, 1, 4);
        fx.surface.clear_selection();
        let state = fx.popup.on_selection_changed(&fx.document, &fx.surface);
        assert_eq!(state, PopupState::Hidden);
        assert_eq!(fx.invoke(), Ok(None));
        assert_eq!(fx.markup(0), "ABCDEFGH");
    }

    #[test]
    fn test_cross_article_selection_hides() {
        let mut fx = Fixture::new(PopupController::new());
        let first = fx.document.container(ContainerId(0)).unwrap().runs()[0].id();
        let second = fx.document.container(ContainerId(1)).unwrap().runs()[0].id();
        fx.surface.select(NativeSelection {
            anchor: BoundaryPoint::new(first, 2),
            focus: BoundaryPoint::new(second, 2),
            rect: Rect::default(),
        });

        let state = fx.popup.on_selection_changed(&fx.document, &fx.surface);
        assert_eq!(state, PopupState::Hidden);
        assert!(fx.popup.pending().is_none());
    }

    #[test]
    fn test_remove_entry_point_on_plain_text_is_noop() {
        let mut fx = Fixture::new(PopupController::new());
        fx.select(1, 0, 5);
        let changed = fx
            .popup
            .remove(&mut fx.document, &mut fx.surface, &mut fx.renderer);
        assert_eq!(changed, Ok(Some(ContainerId(1))));
        assert_eq!(fx.markup(1), "VWXYZ");
    }

    #[test]
    fn test_stale_selection_is_rejected() {
        let mut fx = Fixture::new(PopupController::new());
        fx.select(0, 0, 6);
        // Another mutation splits the run the pending span points into
        let span = fx
            .document
            .container(ContainerId(0))
            .unwrap()
            .span_between(2..3)
            .unwrap();
        fx.document.apply_highlight(&span).unwrap();

        assert!(matches!(fx.invoke(), Err(HighlightError::UnknownRun(_))));
        assert_eq!(fx.popup.state(), PopupState::Hidden);
        assert_eq!(fx.markup(0), "AB[[C]]DEFGH");
    }

    #[test]
    fn test_coalesce_after_action() {
        let config = Config {
            coalesce_runs: true,
            ..Config::default()
        };
        let mut fx = Fixture::new(PopupController::with_config(&config));
        fx.select(0, 1, 3);
        fx.invoke().unwrap();
        fx.select(0, 3, 5);
        fx.invoke().unwrap();

        let container = fx.document.container(ContainerId(0)).unwrap();
        assert_eq!(container.runs().len(), 3);
        assert_eq!(fx.markup(0), "A[[BCDE]]FGH");
    }
}
