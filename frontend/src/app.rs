//! Application root: session bootstrap, navigation and the session context
//! every screen reads its role from.

use common::requests::SessionInfo;
use uuid::Uuid;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{self, ApiError};
use crate::components::approvals::ApprovalQueueComponent;
use crate::components::data_sources::csv::CsvImportComponent;
use crate::components::login::LoginComponent;
use crate::components::modules::ModuleListComponent;
use crate::components::records::RecordsComponent;
use crate::helpers::{show_toast, Liveness};

#[derive(Clone, Debug, PartialEq)]
pub enum Page {
    Modules,
    Records(Uuid),
    Import(Uuid),
    Approvals,
}

enum SessionView {
    Loading,
    SignedOut,
    Active(SessionInfo),
}

pub enum Msg {
    SessionLoaded(Result<SessionInfo, ApiError>),
    SignedIn,
    SignOut,
    Navigate(Page),
}

pub struct App {
    session: SessionView,
    page: Page,
    alive: Liveness,
}

impl App {
    fn load_session(&self, ctx: &Context<Self>) {
        let link = ctx.link().clone();
        let alive = self.alive.clone();
        spawn_local(async move {
            let result = api::get::<SessionInfo>("/api/session").await;
            alive.send(&link, Msg::SessionLoaded(result));
        });
    }

    fn header(&self, ctx: &Context<Self>, info: &SessionInfo) -> Html {
        let link = ctx.link();
        let who = match info {
            SessionInfo::Ready { name, role, .. } => format!("{} ({})", name, role),
            SessionInfo::Degraded { role, .. } => format!("Perfil indisponível ({})", role),
        };
        html! {
            <header>
                <strong>{"Gestão de Registros"}</strong>
                <button class="icon-btn" onclick={link.callback(|_| Msg::Navigate(Page::Modules))}>
                    <i class="material-icons">{"view_list"}</i>{"Módulos"}
                </button>
                if info.role().is_reviewer() {
                    <button class="icon-btn" onclick={link.callback(|_| Msg::Navigate(Page::Approvals))}>
                        <i class="material-icons">{"fact_check"}</i>{"Aprovações"}
                    </button>
                }
                <span class="spacer" />
                <span>{ who }</span>
                <button class="icon-btn" onclick={link.callback(|_| Msg::SignOut)}>
                    <i class="material-icons">{"logout"}</i>{"Sair"}
                </button>
            </header>
        }
    }

    fn page(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let open = link.callback(|id| Msg::Navigate(Page::Records(id)));
        let import = link.callback(|id| Msg::Navigate(Page::Import(id)));
        match &self.page {
            Page::Modules => html! { <ModuleListComponent on_open={open} on_import={import} /> },
            Page::Records(module_id) => html! {
                <RecordsComponent module_id={*module_id} on_import={import} />
            },
            Page::Import(module_id) => html! {
                <CsvImportComponent module_id={*module_id} on_done={open} />
            },
            Page::Approvals => html! { <ApprovalQueueComponent /> },
        }
    }
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let app = App {
            session: SessionView::SignedOut,
            page: Page::Modules,
            alive: Liveness::new(),
        };
        if api::token().is_some() {
            ctx.link().send_message(Msg::SignedIn);
        }
        app
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SignedIn => {
                self.session = SessionView::Loading;
                self.load_session(ctx);
                true
            }
            Msg::SessionLoaded(Ok(info)) => {
                if let SessionInfo::Degraded { .. } = info {
                    show_toast("Não foi possível carregar o perfil. Acesso somente para consulta.");
                }
                self.session = SessionView::Active(info);
                true
            }
            Msg::SessionLoaded(Err(err)) => {
                if !err.is_unauthenticated() {
                    show_toast(&err.message);
                }
                api::clear_token();
                self.session = SessionView::SignedOut;
                true
            }
            Msg::SignOut => {
                api::clear_token();
                self.session = SessionView::SignedOut;
                self.page = Page::Modules;
                true
            }
            Msg::Navigate(page) => {
                self.page = page;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        match &self.session {
            SessionView::Loading => html! { <main>{"Carregando sessão..."}</main> },
            SessionView::SignedOut => html! {
                <LoginComponent on_signed_in={ctx.link().callback(|_| Msg::SignedIn)} />
            },
            SessionView::Active(info) => html! {
                <ContextProvider<SessionInfo> context={info.clone()}>
                    { self.header(ctx, info) }
                    <main>{ self.page(ctx) }</main>
                </ContextProvider<SessionInfo>>
            },
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.alive.end();
    }
}
