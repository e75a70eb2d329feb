//! Settings forms. Nothing here is persisted yet; submits only validate and
//! echo the form back.

use super::dto::{
    FormOutcome, MessageTemplate, Notification, PasswordForm, ProfileForm, SettingsView, Variant,
};
use crate::auth::Session;

pub const DEFAULT_WELCOME: &str =
    "Olá! Bem-vindo(a) ao acompanhamento nutricional. Como posso ajudá-lo(a) hoje?";

// TODO: read templates from the messaging integration once it has a table
const TEMPLATES: [MessageTemplate; 3] = [
    MessageTemplate {
        name: "Lembrete de consulta",
        active: true,
    },
    MessageTemplate {
        name: "Acompanhamento diário",
        active: true,
    },
    MessageTemplate {
        name: "Relatório semanal",
        active: false,
    },
];

const PROFILE_SAVED: Notification = Notification {
    title: "Perfil atualizado",
    description: "Suas informações foram salvas com sucesso.",
    variant: Variant::Default,
};

const PASSWORD_MISMATCH: Notification = Notification {
    title: "Erro",
    description: "As senhas não coincidem.",
    variant: Variant::Destructive,
};

const PASSWORD_CHANGED: Notification = Notification {
    title: "Senha alterada",
    description: "Sua senha foi alterada com sucesso.",
    variant: Variant::Default,
};

pub fn initial_profile(session: &Session) -> ProfileForm {
    ProfileForm {
        name: session.name.clone().unwrap_or_default(),
        email: session.email.clone(),
        whatsapp: String::new(),
        welcome_message: DEFAULT_WELCOME.to_string(),
    }
}

pub fn initial_view(session: &Session) -> SettingsView {
    SettingsView {
        profile: initial_profile(session),
        password: PasswordForm::default(),
        templates: TEMPLATES.to_vec(),
    }
}

/// The email field is read-only: whatever was submitted, the session's wins.
pub fn save_profile(session: &Session, mut form: ProfileForm) -> FormOutcome<ProfileForm> {
    form.email = session.email.clone();
    FormOutcome {
        notification: PROFILE_SAVED,
        form,
    }
}

pub fn change_password(form: PasswordForm) -> FormOutcome<PasswordForm> {
    if form.new_password != form.confirm_password {
        return FormOutcome {
            notification: PASSWORD_MISMATCH,
            form,
        };
    }
    FormOutcome {
        notification: PASSWORD_CHANGED,
        form: PasswordForm::default(),
    }
}
