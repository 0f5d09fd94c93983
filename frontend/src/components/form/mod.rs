//! Dynamic record form: one widget per field, built from the module schema.
//!
//! Edit buffers live in [`FormState`]; the component only renders them and
//! forwards keystrokes. Saving goes through [`FormState::submit`], so a
//! payload that fails validation never reaches the network and a failed
//! save leaves every buffer in place for a retry.

use common::error::summarize;
use common::form::{FormState, SubmitError};
use common::model::record::CurrentRecord;
use common::requests::SaveRecordRequest;
use common::schema::{ResolvedField, Widget};
use serde_json::{Map, Value};
use uuid::Uuid;
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::html::Scope;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{self, ApiError};
use crate::helpers::{show_toast, Liveness};

/// What saving the form does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SaveTarget {
    Create { module_id: Uuid },
    Edit { version_id: Uuid },
}

#[derive(Properties, PartialEq)]
pub struct DynamicFormProps {
    pub fields: Vec<ResolvedField>,
    #[prop_or_default]
    pub initial: Map<String, Value>,
    pub target: SaveTarget,
    pub on_saved: Callback<()>,
    pub on_cancel: Callback<()>,
}

pub enum Msg {
    Input(String, String),
    Submit,
    Finished(Result<(), SubmitError<ApiError>>),
}

pub struct DynamicFormComponent {
    form: FormState,
    saving: bool,
    /// Field errors are shown once the operator has tried to save.
    attempted: bool,
    alive: Liveness,
}

async fn save(target: SaveTarget, content: Map<String, Value>) -> Result<(), ApiError> {
    let body = SaveRecordRequest { content };
    match target {
        SaveTarget::Create { module_id } => {
            api::post::<_, CurrentRecord>(&format!("/api/records/{}", module_id), &body).await?;
        }
        SaveTarget::Edit { version_id } => {
            api::put::<_, CurrentRecord>(&format!("/api/records/version/{}", version_id), &body).await?;
        }
    }
    Ok(())
}

impl Component for DynamicFormComponent {
    type Message = Msg;
    type Properties = DynamicFormProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        DynamicFormComponent {
            form: FormState::new(props.fields.clone(), &props.initial),
            saving: false,
            attempted: false,
            alive: Liveness::new(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Input(name, raw) => {
                self.form.set(&name, &raw);
                true
            }
            Msg::Submit => {
                if self.saving {
                    return false;
                }
                self.attempted = true;
                self.saving = true;

                let form = self.form.clone();
                let target = ctx.props().target;
                let link = ctx.link().clone();
                let alive = self.alive.clone();
                spawn_local(async move {
                    let result = form.submit(|payload| save(target, payload)).await;
                    alive.send(&link, Msg::Finished(result));
                });
                true
            }
            Msg::Finished(Ok(())) => {
                self.saving = false;
                show_toast("Registro salvo");
                ctx.props().on_saved.emit(());
                true
            }
            Msg::Finished(Err(SubmitError::Invalid(errors))) => {
                self.saving = false;
                show_toast(&summarize(&errors));
                true
            }
            Msg::Finished(Err(SubmitError::Rejected(err))) => {
                self.saving = false;
                show_toast(&format!("Não foi possível salvar: {}", err));
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let onsubmit = link.callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::Submit
        });
        let on_cancel = ctx.props().on_cancel.reform(|_: MouseEvent| ());
        html! {
            <div class="dialog">
                <form class="card" {onsubmit}>
                    { for self.form.fields().iter().map(|field| self.field_view(link, field)) }
                    <button class="icon-btn" type="submit" disabled={self.saving}>
                        <i class="material-icons">{"save"}</i>
                        { if self.saving { "Salvando..." } else { "Salvar" } }
                    </button>
                    <button class="icon-btn" type="button" onclick={on_cancel} disabled={self.saving}>
                        {"Cancelar"}
                    </button>
                </form>
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.alive.end();
    }
}

impl DynamicFormComponent {
    fn field_view(&self, link: &Scope<Self>, field: &ResolvedField) -> Html {
        let def = &field.definition;
        let name = field.name().to_string();
        let value = self.form.value(&name).to_string();
        let error = if self.attempted {
            self.form.error_for(&name)
        } else {
            None
        };

        let input = {
            let name = name.clone();
            link.callback(move |e: InputEvent| {
                let input: HtmlInputElement = e.target_unchecked_into();
                Msg::Input(name.clone(), input.value())
            })
        };

        let widget = match &field.widget {
            Widget::TextArea => {
                let name = name.clone();
                let oninput = link.callback(move |e: InputEvent| {
                    let area: HtmlTextAreaElement = e.target_unchecked_into();
                    Msg::Input(name.clone(), area.value())
                });
                html! { <textarea {value} {oninput} rows="4" /> }
            }
            Widget::Checkbox => {
                let name = name.clone();
                let onchange = link.callback(move |e: Event| {
                    let input: HtmlInputElement = e.target_unchecked_into();
                    Msg::Input(name.clone(), input.checked().to_string())
                });
                html! { <input type="checkbox" checked={value == "true"} {onchange} /> }
            }
            Widget::Select(options) => {
                let name = name.clone();
                let onchange = link.callback(move |e: Event| {
                    let select: HtmlSelectElement = e.target_unchecked_into();
                    Msg::Input(name.clone(), select.value())
                });
                html! {
                    <select {onchange}>
                        <option value="" selected={value.is_empty()}>{"Selecione..."}</option>
                        { for options.iter().map(|o| html! {
                            <option value={o.value.clone()} selected={o.value == value}>{ &o.label }</option>
                        }) }
                    </select>
                }
            }
            Widget::Date => html! { <input type="date" {value} oninput={input} /> },
            Widget::Time => html! { <input type="time" {value} oninput={input} /> },
            Widget::Email => html! { <input type="email" {value} oninput={input} /> },
            Widget::Number => html! { <input type="text" inputmode="decimal" {value} oninput={input} /> },
            Widget::Masked => html! {
                <input type="text" inputmode="numeric" placeholder={def.mask.clone()} {value} oninput={input} />
            },
            Widget::Text => html! { <input type="text" {value} oninput={input} /> },
        };

        html! {
            <label class="field" key={name.clone()}>
                { &def.label }
                if def.required { <span>{" *"}</span> }
                { widget }
                if let Some(error) = error {
                    <span class="field-error">{ error.to_string() }</span>
                }
            </label>
        }
    }
}
