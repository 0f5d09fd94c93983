use common::requests::{LoginRequest, LoginResponse, SignUpRequest};
use web_sys::HtmlInputElement;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{self, ApiError};
use crate::helpers::{show_toast, Liveness};

#[derive(Properties, PartialEq)]
pub struct LoginProps {
    pub on_signed_in: Callback<()>,
}

pub enum Msg {
    ToggleMode,
    Submit,
    Finished(Result<LoginResponse, ApiError>),
}

pub struct LoginComponent {
    signing_up: bool,
    busy: bool,
    email_ref: NodeRef,
    password_ref: NodeRef,
    name_ref: NodeRef,
    alive: Liveness,
}

fn input_value(node: &NodeRef) -> String {
    node.cast::<HtmlInputElement>()
        .map(|input| input.value())
        .unwrap_or_default()
}

impl Component for LoginComponent {
    type Message = Msg;
    type Properties = LoginProps;

    fn create(_ctx: &Context<Self>) -> Self {
        LoginComponent {
            signing_up: false,
            busy: false,
            email_ref: NodeRef::default(),
            password_ref: NodeRef::default(),
            name_ref: NodeRef::default(),
            alive: Liveness::new(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::ToggleMode => {
                self.signing_up = !self.signing_up;
                true
            }
            Msg::Submit => {
                if self.busy {
                    return false;
                }
                let email = input_value(&self.email_ref).trim().to_string();
                let password = input_value(&self.password_ref);
                if email.is_empty() || password.is_empty() {
                    show_toast("Informe e-mail e senha");
                    return false;
                }
                let name = self.signing_up.then(|| input_value(&self.name_ref));
                self.busy = true;

                let link = ctx.link().clone();
                let alive = self.alive.clone();
                spawn_local(async move {
                    let result = match name {
                        Some(name) => {
                            api::post("/api/auth/signup", &SignUpRequest { email, password, name }).await
                        }
                        None => api::post("/api/auth/login", &LoginRequest { email, password }).await,
                    };
                    alive.send(&link, Msg::Finished(result));
                });
                true
            }
            Msg::Finished(Ok(response)) => {
                self.busy = false;
                api::store_token(&response.access_token);
                ctx.props().on_signed_in.emit(());
                true
            }
            Msg::Finished(Err(err)) => {
                self.busy = false;
                show_toast(&err.message);
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
        html! {
            <main>
                <form class="card" {onsubmit}>
                    <h2>{ if self.signing_up { "Criar conta" } else { "Entrar" } }</h2>
                    if self.signing_up {
                        <label class="field">{"Nome"}<input ref={self.name_ref.clone()} type="text" /></label>
                    }
                    <label class="field">{"E-mail"}<input ref={self.email_ref.clone()} type="email" /></label>
                    <label class="field">{"Senha"}<input ref={self.password_ref.clone()} type="password" /></label>
                    <button class="icon-btn" type="submit" disabled={self.busy}>
                        { if self.signing_up { "Cadastrar" } else { "Entrar" } }
                    </button>
                    <button class="icon-btn" type="button" onclick={link.callback(|_| Msg::ToggleMode)}>
                        { if self.signing_up { "Já tenho conta" } else { "Criar conta" } }
                    </button>
                </form>
            </main>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.alive.end();
    }
}
