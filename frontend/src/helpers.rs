//! Small browser helpers shared by every screen.

use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlElement, Url};

/// Tells async tasks whether the component that spawned them is still
/// mounted. Components create one in `create`, hand clones to every task,
/// and call [`Liveness::end`] from `destroy`; a task drops its result when
/// the owner is gone instead of updating a component that no longer exists.
#[derive(Clone, Debug)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    pub fn new() -> Self {
        Liveness(Rc::new(Cell::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub fn end(&self) {
        self.0.set(false);
    }

    /// Delivers `msg` to `link` only while the owner is mounted.
    pub fn send<C: yew::Component>(&self, link: &yew::html::Scope<C>, msg: C::Message) {
        if self.is_alive() {
            link.send_message(msg);
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Displays a temporary notification at the bottom of the screen. Used for
/// every operator-facing success or error message.
pub fn show_toast(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let (Ok(toast), Some(body)) = (document.create_element("div"), document.body()) {
                toast.set_text_content(Some(message));
                let html_toast: HtmlElement = toast.unchecked_into();
                let style = html_toast.style();
                style.set_property("position", "fixed").ok();
                style.set_property("bottom", "20px").ok();
                style.set_property("left", "50%").ok();
                style.set_property("transform", "translateX(-50%)").ok();
                style.set_property("background", "rgba(0, 0, 0, 0.8)").ok();
                style.set_property("color", "#fff").ok();
                style.set_property("padding", "10px 20px").ok();
                style.set_property("border-radius", "4px").ok();
                style.set_property("z-index", "10000").ok();

                if body.append_child(&html_toast).is_ok() {
                    wasm_bindgen_futures::spawn_local(async move {
                        gloo_timers::future::TimeoutFuture::new(4000).await;
                        if let Some(parent) = html_toast.parent_node() {
                            parent.remove_child(&html_toast).ok();
                        }
                    });
                }
            }
        }
    }
}

/// Offers `bytes` to the operator as a downloaded file.
pub fn save_file(file_name: &str, bytes: &[u8], mime: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    Url::revoke_object_url(&url)
}
