use std::collections::HashMap;
use std::rc::Weak;

use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, MouseEvent};

use reflex_core::surface::{Bounds, Field, Position, Surface};
use reflex_core::target::TargetId;

use crate::diag;
use crate::page::{COMBO_ID, GAME_AREA_ID, SCORE_ID, TARGET_CLASS, TIME_ID};
use crate::runtime::{WeakRuntime, dispatch_hit};

/// A target element plus the slot its click listener is stored under.
#[derive(Clone)]
pub struct DomHandle {
    element: Option<HtmlElement>,
    slot: u32,
}

/// Elements the surface draws into, looked up once at load.
pub struct DomRefs {
    document: Document,
    area: HtmlElement,
    score: Option<HtmlElement>,
    combo: Option<HtmlElement>,
    time: Option<HtmlElement>,
}

fn html_element(document: &Document, id: &str) -> Option<HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

impl DomRefs {
    /// Only the play area is required; missing HUD fields are skipped.
    pub fn lookup(document: &Document) -> Result<Self, JsValue> {
        let area = html_element(document, GAME_AREA_ID)
            .ok_or_else(|| JsValue::from_str("missing #game-area element"))?;
        Ok(Self {
            document: document.clone(),
            area,
            score: html_element(document, SCORE_ID),
            combo: html_element(document, COMBO_ID),
            time: html_element(document, TIME_ID),
        })
    }
}

/// `Surface` backed by absolutely positioned `<div>`s inside `#game-area`.
pub struct DomSurface {
    refs: DomRefs,
    listeners: HashMap<u32, Closure<dyn FnMut(MouseEvent)>>,
    /// Listeners of removed targets. Dropped outside of their own callback.
    retired: Vec<Closure<dyn FnMut(MouseEvent)>>,
    next_slot: u32,
    runtime: WeakRuntime,
}

impl DomSurface {
    pub fn new(refs: DomRefs, runtime: WeakRuntime) -> Self {
        Self {
            refs,
            listeners: HashMap::new(),
            retired: Vec::new(),
            next_slot: 0,
            runtime,
        }
    }

    /// Drop listeners of removed targets. Call from a callback other than a
    /// click handler.
    pub fn release_retired(&mut self) {
        self.retired.clear();
    }

    fn build_target(&self, position: Position, size: f64) -> Result<HtmlElement, JsValue> {
        let element: HtmlElement = self.refs.document.create_element("div")?.dyn_into()?;
        element.class_list().add_1(TARGET_CLASS)?;
        let style = element.style();
        style.set_property("width", &format!("{size}px"))?;
        style.set_property("height", &format!("{size}px"))?;
        style.set_property("left", &format!("{}px", position.x))?;
        style.set_property("top", &format!("{}px", position.y))?;
        self.refs.area.append_child(&element)?;
        Ok(element)
    }
}

impl Surface for DomSurface {
    type Handle = DomHandle;

    fn bounds(&self) -> Bounds {
        let rect = self.refs.area.get_bounding_client_rect();
        Bounds::new(rect.width(), rect.height())
    }

    fn create_entity(&mut self, position: Position, size: f64) -> DomHandle {
        self.next_slot += 1;
        let element = match self.build_target(position, size) {
            Ok(el) => Some(el),
            Err(e) => {
                diag::console_warn!("Failed to create target element: {e:?}");
                None
            },
        };
        DomHandle {
            element,
            slot: self.next_slot,
        }
    }

    fn remove_entity(&mut self, handle: &DomHandle) {
        if let Some(element) = &handle.element {
            element.remove();
        }
        if let Some(listener) = self.listeners.remove(&handle.slot) {
            self.retired.push(listener);
        }
    }

    fn set_text(&mut self, field: Field, value: &str) {
        let element = match field {
            Field::Score => &self.refs.score,
            Field::Combo => &self.refs.combo,
            Field::Time => &self.refs.time,
        };
        if let Some(element) = element {
            element.set_text_content(Some(value));
        }
    }

    fn subscribe_click(&mut self, handle: &DomHandle, target: TargetId) {
        let Some(element) = &handle.element else {
            return;
        };
        let runtime = Weak::clone(&self.runtime);
        let listener = Closure::<dyn FnMut(MouseEvent)>::new(move |_evt: MouseEvent| {
            dispatch_hit(&runtime, target);
        });
        if let Err(e) =
            element.add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
        {
            diag::console_warn!("Failed to attach click listener: {e:?}");
            return;
        }
        self.listeners.insert(handle.slot, listener);
    }
}
