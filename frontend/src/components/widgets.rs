use yew::prelude::*;

/// Material icon with a label underneath, as used in every toolbar.
pub fn icon_button(icon_name: &str, label: &str, on_click: Callback<MouseEvent>, disabled: bool) -> Html {
    html! {
        <button class="icon-btn" onclick={on_click} {disabled}>
            <i class="material-icons">{ icon_name.to_string() }</i>
            <span class="icon-label">{ label.to_string() }</span>
        </button>
    }
}

pub fn step_indicator(labels: &[&str], current: usize) -> Html {
    html! {
        <ol class="steps">
            { for labels.iter().enumerate().map(|(i, label)| {
                let class = match i.cmp(&current) {
                    std::cmp::Ordering::Less => "step done",
                    std::cmp::Ordering::Equal => "step current",
                    std::cmp::Ordering::Greater => "step",
                };
                html! { <li {class}>{ label.to_string() }</li> }
            }) }
        </ol>
    }
}
