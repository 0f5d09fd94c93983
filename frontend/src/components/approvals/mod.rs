//! Approval queue: pending versions grouped into import batches and single
//! records, approved or rejected card by card.

use common::approval::{ApprovalItem, BulkOutcome, ReviewDecision};
use common::authz::{self, Action, Decision};
use common::model::profile::Role;
use common::model::record::PendingRecord;
use common::requests::{ApproveRequest, PendingResponse, RejectRequest, SessionInfo};
use uuid::Uuid;
use web_sys::HtmlInputElement;
use yew::html::Scope;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{self, ApiError};
use crate::helpers::{show_toast, Liveness};

/// Number of content entries previewed on a card.
const PREVIEW_ENTRIES: usize = 4;

pub enum Msg {
    Loaded(Result<PendingResponse, ApiError>),
    Approve(Vec<Uuid>),
    StartReject(Vec<Uuid>),
    ReasonChanged(String),
    ConfirmReject,
    CancelReject,
    Reviewed(Result<BulkOutcome, ApiError>),
}

pub struct ApprovalQueueComponent {
    role: Role,
    items: Option<Vec<ApprovalItem>>,
    /// Versions awaiting a rejection reason.
    rejecting: Option<Vec<Uuid>>,
    reason: String,
    busy: bool,
    alive: Liveness,
}

/// Checks that run before any review call: the role may review and a
/// rejection carries a reason. Stale screens get an error, never a silent
/// no-op.
pub fn review_guard(role: Role, decision: &ReviewDecision) -> Result<(), String> {
    let action = match decision {
        ReviewDecision::Approve => Action::Approve,
        ReviewDecision::Reject { .. } => Action::Reject,
    };
    if let Decision::Deny(reason) = authz::authorize(role, action, None) {
        return Err(reason.to_string());
    }
    decision.validate().map_err(|e| e.to_string())
}

impl ApprovalQueueComponent {
    fn load(&self, ctx: &Context<Self>) {
        let link = ctx.link().clone();
        let alive = self.alive.clone();
        spawn_local(async move {
            let result = api::get::<PendingResponse>("/api/approvals/pending").await;
            alive.send(&link, Msg::Loaded(result));
        });
    }

    fn review(&mut self, ctx: &Context<Self>, version_ids: Vec<Uuid>, decision: ReviewDecision) -> bool {
        if self.busy {
            return false;
        }
        if let Err(message) = review_guard(self.role, &decision) {
            show_toast(&message);
            return false;
        }
        self.busy = true;
        let link = ctx.link().clone();
        let alive = self.alive.clone();
        spawn_local(async move {
            let result = match decision {
                ReviewDecision::Approve => {
                    api::post("/api/approvals/approve", &ApproveRequest { version_ids }).await
                }
                ReviewDecision::Reject { reason } => {
                    api::post("/api/approvals/reject", &RejectRequest { version_ids, reason }).await
                }
            };
            alive.send(&link, Msg::Reviewed(result));
        });
        true
    }
}

impl Component for ApprovalQueueComponent {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let role = ctx
            .link()
            .context::<SessionInfo>(Callback::noop())
            .map(|(info, _)| info.role())
            .unwrap_or(Role::ReadOnly);
        let component = ApprovalQueueComponent {
            role,
            items: None,
            rejecting: None,
            reason: String::new(),
            busy: false,
            alive: Liveness::new(),
        };
        component.load(ctx);
        component
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(Ok(response)) => {
                self.items = Some(response.items);
                true
            }
            Msg::Loaded(Err(err)) => {
                show_toast(&err.message);
                self.items = Some(Vec::new());
                true
            }
            Msg::Approve(ids) => self.review(ctx, ids, ReviewDecision::Approve),
            Msg::StartReject(ids) => {
                self.rejecting = Some(ids);
                self.reason.clear();
                true
            }
            Msg::ReasonChanged(reason) => {
                self.reason = reason;
                false
            }
            Msg::ConfirmReject => {
                let Some(ids) = self.rejecting.clone() else {
                    return false;
                };
                let decision = ReviewDecision::Reject {
                    reason: self.reason.clone(),
                };
                // The dialog stays open on failure so the reason is not lost.
                self.review(ctx, ids, decision)
            }
            Msg::CancelReject => {
                self.rejecting = None;
                true
            }
            Msg::Reviewed(result) => {
                self.busy = false;
                match result {
                    Ok(outcome) => {
                        self.rejecting = None;
                        show_toast(&format!("{} de {} registros enviados para revisão", outcome.succeeded, outcome.total));
                    }
                    Err(err) => show_toast(&err.message),
                }
                // Partial failures leave part of the queue reviewed.
                self.load(ctx);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let Some(items) = &self.items else {
            return html! { <p>{"Carregando pendências..."}</p> };
        };
        html! {
            <div>
                <h2>{"Aprovações pendentes"}</h2>
                if items.is_empty() {
                    <p>{"Nenhum registro aguardando aprovação."}</p>
                }
                { for items.iter().map(|item| self.card(link, item)) }
                { self.reject_dialog(link) }
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.alive.end();
    }
}

impl ApprovalQueueComponent {
    fn card(&self, link: &Scope<Self>, item: &ApprovalItem) -> Html {
        let ids = item.version_ids();
        let (key, title, records): (String, String, &[PendingRecord]) = match item {
            ApprovalItem::Batch(group) => (
                group.batch_id.to_string(),
                format!("{}: lote importado com {} registros", group.module.name, group.records.len()),
                &group.records,
            ),
            ApprovalItem::Single(record) => (
                record.version.id.to_string(),
                record.module.name.clone(),
                std::slice::from_ref(record),
            ),
        };
        let approve = {
            let ids = ids.clone();
            link.callback(move |_| Msg::Approve(ids.clone()))
        };
        let reject = link.callback(move |_| Msg::StartReject(ids.clone()));

        html! {
            <div class="card" key={key}>
                <h3>{ title }</h3>
                { for records.iter().take(3).map(preview) }
                if records.len() > 3 {
                    <p>{ format!("... e mais {} registros", records.len() - 3) }</p>
                }
                <button class="icon-btn" disabled={self.busy} onclick={approve}>
                    <i class="material-icons">{"check"}</i>{"Aprovar"}
                </button>
                <button class="icon-btn" disabled={self.busy} onclick={reject}>
                    <i class="material-icons">{"close"}</i>{"Rejeitar"}
                </button>
            </div>
        }
    }

    fn reject_dialog(&self, link: &Scope<Self>) -> Html {
        let Some(ids) = &self.rejecting else {
            return html! {};
        };
        let oninput = link.callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::ReasonChanged(input.value())
        });
        html! {
            <div class="dialog">
                <div class="card">
                    <h3>{ format!("Rejeitar {} registro(s)", ids.len()) }</h3>
                    <label class="field">
                        {"Motivo da rejeição"}
                        <input type="text" value={self.reason.clone()} {oninput} />
                    </label>
                    <button class="icon-btn" disabled={self.busy} onclick={link.callback(|_| Msg::ConfirmReject)}>
                        {"Confirmar"}
                    </button>
                    <button class="icon-btn" disabled={self.busy} onclick={link.callback(|_| Msg::CancelReject)}>
                        {"Cancelar"}
                    </button>
                </div>
            </div>
        }
    }
}

fn preview(record: &PendingRecord) -> Html {
    let entries: Vec<String> = record
        .version
        .content
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .take(PREVIEW_ENTRIES)
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => format!("{}: {}", key, s),
            other => format!("{}: {}", key, other),
        })
        .collect();
    html! { <p class="preview">{ entries.join(" | ") }</p> }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employees_cannot_review() {
        let denied = review_guard(Role::Employee, &ReviewDecision::Approve);
        assert_eq!(
            denied,
            Err("Apenas administradores e supervisores podem revisar registros".to_string())
        );
        assert!(review_guard(Role::Supervisor, &ReviewDecision::Approve).is_ok());
    }

    #[test]
    fn rejection_needs_a_reason() {
        let blank = ReviewDecision::Reject { reason: "  ".into() };
        assert_eq!(review_guard(Role::Admin, &blank), Err("Informe o motivo da rejeição".to_string()));
        let reasoned = ReviewDecision::Reject { reason: "CPF divergente".into() };
        assert!(review_guard(Role::Admin, &reasoned).is_ok());
    }
}
