//! CSV import screen: upload a file, review the inferred column mapping and
//! follow the background import until it finishes.

use common::error::ValidationError;
use common::jobs::{JobStarted, JobStatus};
use common::model::field::FieldType;
use common::reconcile::mapping::{ColumnMapping, ImportPlan, MappingTarget};
use common::requests::{CsvPreview, ImportRequest, ModuleDetail};
use gloo_timers::future::TimeoutFuture;
use uuid::Uuid;
use web_sys::{FormData, HtmlInputElement, HtmlSelectElement};
use yew::html::Scope;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{self, ApiError};
use crate::helpers::{show_toast, Liveness};

mod mapping;

use mapping::{choice_of, retype, target_for};

const POLL_INTERVAL_MS: u32 = 1000;

#[derive(Properties, PartialEq)]
pub struct CsvImportProps {
    pub module_id: Uuid,
    /// Called with the module id once the import completed.
    pub on_done: Callback<Uuid>,
}

pub enum Msg {
    DetailLoaded(Result<ModuleDetail, ApiError>),
    Upload,
    Previewed(Result<CsvPreview, ApiError>),
    SetTarget(usize, String),
    SetType(usize, FieldType),
    StartImport,
    Started(Result<JobStarted, ApiError>),
    Polled(Result<JobStatus, ApiError>),
}

pub struct CsvImportComponent {
    detail: Option<ModuleDetail>,
    file_ref: NodeRef,
    busy: bool,
    preview: Option<CsvPreview>,
    mappings: Vec<ColumnMapping>,
    status: Option<JobStatus>,
    alive: Liveness,
}

impl CsvImportComponent {
    /// Checks the mapping the way the server will, so mistakes are reported
    /// before the upload is sent again.
    fn check_mapping(&self, ctx: &Context<Self>) -> Result<(), ValidationError> {
        let (Some(preview), Some(detail)) = (&self.preview, &self.detail) else {
            return Err(ValidationError::Csv("nenhum arquivo carregado".into()));
        };
        ImportPlan::build(ctx.props().module_id, &preview.csv.headers, &self.mappings, &detail.fields)?;
        Ok(())
    }

    fn poll(&self, ctx: &Context<Self>, job_id: String) {
        let link = ctx.link().clone();
        let alive = self.alive.clone();
        let path = format!("/api/data_sources/csv/status/{}", job_id);
        spawn_local(async move {
            loop {
                TimeoutFuture::new(POLL_INTERVAL_MS).await;
                if !alive.is_alive() {
                    break;
                }
                let result = api::get::<JobStatus>(&path).await;
                let finished = match &result {
                    Ok(status) => status.is_finished(),
                    Err(_) => true,
                };
                alive.send(&link, Msg::Polled(result));
                if finished {
                    break;
                }
            }
        });
    }
}

impl Component for CsvImportComponent {
    type Message = Msg;
    type Properties = CsvImportProps;

    fn create(ctx: &Context<Self>) -> Self {
        let alive = Liveness::new();
        let link = ctx.link().clone();
        let task_alive = alive.clone();
        let path = format!("/api/modules/{}", ctx.props().module_id);
        spawn_local(async move {
            let result = api::get::<ModuleDetail>(&path).await;
            task_alive.send(&link, Msg::DetailLoaded(result));
        });

        CsvImportComponent {
            detail: None,
            file_ref: NodeRef::default(),
            busy: false,
            preview: None,
            mappings: Vec::new(),
            status: None,
            alive,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::DetailLoaded(Ok(detail)) => {
                self.detail = Some(detail);
                true
            }
            Msg::DetailLoaded(Err(err)) => {
                show_toast(&err.message);
                true
            }
            Msg::Upload => {
                let Some(file) = self
                    .file_ref
                    .cast::<HtmlInputElement>()
                    .and_then(|input| input.files())
                    .and_then(|files| files.get(0))
                else {
                    show_toast("Selecione um arquivo CSV");
                    return false;
                };
                let Ok(form) = FormData::new() else {
                    return false;
                };
                if form.append_with_str("module_id", &ctx.props().module_id.to_string()).is_err()
                    || form.append_with_blob_and_filename("file", &file, &file.name()).is_err()
                {
                    show_toast("Não foi possível ler o arquivo");
                    return false;
                }
                self.busy = true;
                self.status = None;

                let link = ctx.link().clone();
                let alive = self.alive.clone();
                spawn_local(async move {
                    let result = api::post_form::<CsvPreview>("/api/data_sources/csv/preview", form).await;
                    alive.send(&link, Msg::Previewed(result));
                });
                true
            }
            Msg::Previewed(Ok(preview)) => {
                self.busy = false;
                self.mappings = preview.mappings.clone();
                self.preview = Some(preview);
                true
            }
            Msg::Previewed(Err(err)) => {
                self.busy = false;
                show_toast(&err.message);
                true
            }
            Msg::SetTarget(index, choice) => {
                let (Some(preview), Some(detail)) = (&self.preview, &self.detail) else {
                    return false;
                };
                let (Some(check), Some(mapping)) = (preview.columns.get(index), self.mappings.get_mut(index)) else {
                    return false;
                };
                mapping.target = target_for(&choice, check, &detail.fields);
                true
            }
            Msg::SetType(index, field_type) => {
                if let Some(mapping) = self.mappings.get_mut(index) {
                    retype(&mut mapping.target, field_type);
                }
                true
            }
            Msg::StartImport => {
                if self.busy {
                    return false;
                }
                if let Err(err) = self.check_mapping(ctx) {
                    show_toast(&err.to_string());
                    return false;
                }
                let Some(preview) = &self.preview else {
                    return false;
                };
                let request = ImportRequest {
                    module_id: ctx.props().module_id,
                    file_name: preview.file_name.clone(),
                    csv: preview.csv.clone(),
                    mappings: self.mappings.clone(),
                };
                self.busy = true;
                let link = ctx.link().clone();
                let alive = self.alive.clone();
                spawn_local(async move {
                    let result = api::post::<_, JobStarted>("/api/data_sources/csv/import", &request).await;
                    alive.send(&link, Msg::Started(result));
                });
                true
            }
            Msg::Started(Ok(started)) => {
                self.status = Some(JobStatus::Pending);
                self.poll(ctx, started.job_id);
                true
            }
            Msg::Started(Err(err)) => {
                self.busy = false;
                show_toast(&err.message);
                true
            }
            Msg::Polled(Ok(status)) => {
                match &status {
                    JobStatus::Completed(message) => {
                        self.busy = false;
                        show_toast(message);
                        ctx.props().on_done.emit(ctx.props().module_id);
                    }
                    JobStatus::Failed(message) => {
                        self.busy = false;
                        show_toast(message);
                    }
                    _ => {}
                }
                self.status = Some(status);
                true
            }
            Msg::Polled(Err(err)) => {
                self.busy = false;
                show_toast(&err.message);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let title = self
            .detail
            .as_ref()
            .map(|d| format!("Importar CSV em {}", d.module.name))
            .unwrap_or_else(|| "Importar CSV".to_string());
        html! {
            <div>
                <h2>{ title }</h2>
                <div class="card">
                    <input ref={self.file_ref.clone()} type="file" accept=".csv,text/csv" />
                    <button class="icon-btn" disabled={self.busy} onclick={link.callback(|_| Msg::Upload)}>
                        <i class="material-icons">{"table_chart"}</i>{"Analisar arquivo"}
                    </button>
                </div>
                { self.mapping_table(link) }
                { status_line(self.status.as_ref()) }
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.alive.end();
    }
}

impl CsvImportComponent {
    fn mapping_table(&self, link: &Scope<Self>) -> Html {
        let (Some(preview), Some(detail)) = (&self.preview, &self.detail) else {
            return html! {};
        };
        html! {
            <div class="card">
                <p>{ format!("{}: {} linhas", preview.file_name, preview.csv.rows.len()) }</p>
                <table>
                    <thead>
                        <tr>
                            <th>{"Coluna"}</th>
                            <th>{"Exemplo"}</th>
                            <th>{"Destino"}</th>
                            <th>{"Tipo"}</th>
                        </tr>
                    </thead>
                    <tbody>
                        { for preview.columns.iter().zip(&self.mappings).enumerate().map(|(index, (check, mapping))| {
                            let choice = choice_of(&mapping.target);
                            let on_target = link.callback(move |e: Event| {
                                let select: HtmlSelectElement = e.target_unchecked_into();
                                Msg::SetTarget(index, select.value())
                            });
                            html! {
                                <tr key={check.title.clone()}>
                                    <td>{ &check.title }</td>
                                    <td>{ check.first_row.clone().unwrap_or_default() }</td>
                                    <td>
                                        <select onchange={on_target}>
                                            <option value="ignore" selected={choice == "ignore"}>{"Ignorar"}</option>
                                            <option value="new" selected={choice == "new"}>{"Novo campo"}</option>
                                            { for detail.fields.iter().map(|field| {
                                                let value = format!("field:{}", field.technical_name);
                                                let selected = choice == value;
                                                html! {
                                                    <option {selected} {value}>{ &field.label }</option>
                                                }
                                            }) }
                                        </select>
                                    </td>
                                    <td>{ type_cell(link, index, &mapping.target) }</td>
                                </tr>
                            }
                        }) }
                    </tbody>
                </table>
                <button class="icon-btn" disabled={self.busy} onclick={link.callback(|_| Msg::StartImport)}>
                    <i class="material-icons">{"upload"}</i>{"Importar"}
                </button>
            </div>
        }
    }
}

fn type_cell(link: &Scope<CsvImportComponent>, index: usize, target: &MappingTarget) -> Html {
    let MappingTarget::New { draft } = target else {
        return html! {};
    };
    let onchange = link.callback(move |e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        let field_type = select
            .value()
            .parse::<usize>()
            .ok()
            .and_then(|i| FieldType::ALL.get(i).copied())
            .unwrap_or(FieldType::ShortText);
        Msg::SetType(index, field_type)
    });
    html! {
        <select {onchange}>
            { for FieldType::ALL.iter().enumerate().map(|(i, t)| html! {
                <option value={i.to_string()} selected={*t == draft.field_type}>{ t.label() }</option>
            }) }
        </select>
    }
}

fn status_line(status: Option<&JobStatus>) -> Html {
    let text = match status {
        None => return html! {},
        Some(JobStatus::Pending) => "Importação aguardando início...".to_string(),
        Some(JobStatus::InProgress(rows)) => format!("{} linhas importadas...", rows),
        Some(JobStatus::Completed(message)) => message.clone(),
        Some(JobStatus::Failed(message)) => format!("Falha na importação: {}", message),
    };
    html! { <p class="card">{ text }</p> }
}
