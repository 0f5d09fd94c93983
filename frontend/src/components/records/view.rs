use common::model::record::CurrentRecord;
use serde_json::Value;
use yew::html::Scope;
use yew::prelude::*;

use crate::components::form::DynamicFormComponent;

use super::messages::Msg;
use super::state::RecordsComponent;

pub fn view(component: &RecordsComponent, ctx: &Context<RecordsComponent>) -> Html {
    let link = ctx.link();
    let Some(detail) = &component.detail else {
        return html! { <p>{"Carregando módulo..."}</p> };
    };
    let module_id = ctx.props().module_id;
    let on_import = ctx.props().on_import.reform(move |_: MouseEvent| module_id);

    html! {
        <div>
            <h2>{ &detail.module.name }</h2>
            <div class="icon-toolbar">
                if detail.can_insert {
                    <button class="icon-btn" onclick={link.callback(|_| Msg::OpenNew)}>
                        <i class="material-icons">{"add"}</i>{"Novo registro"}
                    </button>
                    <button class="icon-btn" onclick={on_import}>
                        <i class="material-icons">{"upload_file"}</i>{"Importar CSV"}
                    </button>
                }
                if detail.can_export {
                    <button class="icon-btn" disabled={component.exporting} onclick={link.callback(|_| Msg::Export)}>
                        <i class="material-icons">{"download"}</i>{"Exportar CSV"}
                    </button>
                }
            </div>
            { build_table(component, link) }
            { build_pager(component, link) }
            if let Some(editor) = &component.editor {
                <DynamicFormComponent
                    fields={component.fields.clone()}
                    initial={editor.initial.clone()}
                    target={editor.target}
                    on_saved={link.callback(|_| Msg::Saved)}
                    on_cancel={link.callback(|_| Msg::CloseForm)}
                />
            }
        </div>
    }
}

fn build_table(component: &RecordsComponent, link: &Scope<RecordsComponent>) -> Html {
    if component.loading {
        return html! { <p>{"Carregando registros..."}</p> };
    }
    if component.records.is_empty() {
        return html! { <p>{"Nenhum registro."}</p> };
    }
    html! {
        <table>
            <thead>
                <tr>
                    <th>{"Status"}</th>
                    <th>{"Data"}</th>
                    { for component.fields.iter().map(|f| html! { <th>{ &f.definition.label }</th> }) }
                    <th />
                </tr>
            </thead>
            <tbody>
                { for component.records.iter().map(|record| build_row(component, link, record)) }
            </tbody>
        </table>
    }
}

fn build_row(component: &RecordsComponent, link: &Scope<RecordsComponent>, record: &CurrentRecord) -> Html {
    let (can_edit, can_delete) = component
        .detail
        .as_ref()
        .map_or((false, false), |d| (d.can_edit, d.can_delete));
    let master_id = record.master.id;
    let edit = {
        let record = record.clone();
        link.callback(move |_| Msg::OpenEdit(record.clone()))
    };
    let rejection = record.version.rejection_reason.clone();

    html! {
        <tr key={record.version.id.to_string()}>
            <td>
                <span class="status" title={rejection}>{ record.version.status.label() }</span>
            </td>
            <td>{ record.version.created_at.format("%d/%m/%Y").to_string() }</td>
            { for component.fields.iter().map(|field| {
                let text = record
                    .version
                    .content
                    .get(field.name())
                    .filter(|v| !v.is_null())
                    .map(|v: &Value| field.display(v))
                    .unwrap_or_default();
                html! { <td>{ text }</td> }
            }) }
            <td>
                if can_edit {
                    <button class="icon-btn" title="Editar" onclick={edit}>
                        <i class="material-icons">{"edit"}</i>
                    </button>
                }
                if can_delete {
                    <button
                        class="icon-btn"
                        title="Excluir"
                        disabled={component.deleting == Some(master_id)}
                        onclick={link.callback(move |_| Msg::Delete(master_id))}
                    >
                        <i class="material-icons">{"delete"}</i>
                    </button>
                }
            </td>
        </tr>
    }
}

fn build_pager(component: &RecordsComponent, link: &Scope<RecordsComponent>) -> Html {
    let page = component.page;
    html! {
        <div class="pager">
            <button
                class="icon-btn"
                disabled={page == 0 || component.loading}
                onclick={link.callback(move |_| Msg::ChangePage(page.saturating_sub(1)))}
            >
                {"Anterior"}
            </button>
            <span>{ format!(" Página {} ", page + 1) }</span>
            <button
                class="icon-btn"
                disabled={!component.has_next_page() || component.loading}
                onclick={link.callback(move |_| Msg::ChangePage(page + 1))}
            >
                {"Próxima"}
            </button>
        </div>
    }
}
