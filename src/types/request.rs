use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct NewBoard {
    pub(crate) title: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdateTitle {
    pub(crate) title: String,
}

#[derive(Deserialize)]
pub(crate) struct NewCard {
    pub(crate) title: String,
    pub(crate) description: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdateCard {
    pub(crate) title: String,
    pub(crate) description: String,
}

#[derive(Deserialize)]
pub(crate) struct MoveCard {
    pub(crate) movement: Movement,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Movement {
    Next,
    Prev,
}

#[derive(Deserialize)]
pub(crate) struct NewColumn {
    pub(crate) name: String,
    pub(crate) after: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct CallbackParams {
    pub(crate) code: String,
    pub(crate) state: String,
}
