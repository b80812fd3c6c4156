use crate::config;
use crate::events::AppEvent;
use crate::gui::theme;
use crate::gui::trail::{self, Point, TrailState};
use crate::gui::window;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub struct AppModel {
    pub state: Rc<RefCell<TrailState>>,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
    fade_out: TimerSlot<glib::SourceId>,
    tick: Option<gtk::TickCallbackId>,
}

/// Shared slot for the pending fade-out timer handle.
///
/// A one-shot source is removed from the main context by firing, so its
/// `SourceId` must never be removed afterwards. The timeout closure holds a
/// clone of the slot and forgets the handle the moment it fires; any handle
/// still found in the slot is therefore live and safe to remove.
struct TimerSlot<T> {
    inner: Rc<RefCell<Option<T>>>,
}

impl<T> TimerSlot<T> {
    fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(None)),
        }
    }

    /// Stores a newly armed timer, handing back any still-pending one so the
    /// caller can remove it.
    fn arm(&self, handle: T) -> Option<T> {
        self.inner.borrow_mut().replace(handle)
    }

    /// Takes the pending timer for removal; `None` if it already fired.
    fn disarm(&self) -> Option<T> {
        self.inner.borrow_mut().take()
    }

    /// Forgets the handle without removal; called by the timer itself.
    fn mark_fired(&self) {
        self.inner.borrow_mut().take();
    }
}

impl<T> Clone for TimerSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[derive(Debug)]
pub enum AppMsg {
    PointerMove(Point),
    FadeOutElapsed,
    ConfigReload,
    Stop,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload => AppMsg::ConfigReload,
            AppEvent::Shutdown => AppMsg::Stop,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (TrailState, async_channel::Receiver<AppEvent>);
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Comet"),
            set_decorated: false,
            add_css_class: "comet-window",

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(AppMsg::Stop);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                add_css_class: "comet-drawing-area",

                add_controller = gtk::EventControllerMotion {
                    connect_motion[sender] => move |_, x, y| {
                        sender.input(AppMsg::PointerMove(Point::new(x, y)));
                    }
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (state, rx) = init;

        theme::load_css();
        window::init_layer_shell(&root);

        let state = Rc::new(RefCell::new(state));

        let model = AppModel {
            state: state.clone(),
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
            fade_out: TimerSlot::new(),
            tick: None,
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        // The seat query needs a realized surface, so seed once the window
        // has one. The model also seeds on the first motion event in case
        // the pointer cannot be queried.
        let state_seed = state.clone();
        root.connect_realize(move |window| {
            if let Some(pos) = window::get_cursor_position(window) {
                state_seed.borrow_mut().set_initial_target(pos);
            }
        });

        let state_draw = state.clone();
        widgets.drawing_area.set_draw_func(move |_, cr, _, _| {
            if let Err(e) = trail::draw(cr, &state_draw.borrow()) {
                log::error!("Drawing error: {}", e);
            }
        });

        // The frame loop: advance the chain on every frame-clock tick until
        // Stop removes the callback.
        let state_tick = state.clone();
        model.tick = Some(widgets.drawing_area.add_tick_callback(move |area, _| {
            state_tick.borrow_mut().advance_frame();
            area.queue_draw();
            glib::ControlFlow::Continue
        }));

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        root.set_visible(true);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::PointerMove(point) => {
                let action = self.state.borrow_mut().update_pointer(point, Instant::now());
                if action.cancel_fade_out {
                    self.cancel_fade_out();
                }
                if action.schedule_fade_out {
                    let delay = Duration::from_millis(self.state.borrow().config.fading_time_ms);
                    let sender = sender.clone();
                    let slot = self.fade_out.clone();
                    let id = glib::timeout_add_local_once(delay, move || {
                        slot.mark_fired();
                        sender.input(AppMsg::FadeOutElapsed);
                    });
                    if let Some(old) = self.fade_out.arm(id) {
                        old.remove();
                    }
                }
            }
            AppMsg::FadeOutElapsed => {
                self.state.borrow_mut().force_idle();
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    self.state.borrow_mut().apply_config(new_config);
                    self.drawing_area.queue_draw();
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
            AppMsg::Stop => {
                if let Some(tick) = self.tick.take() {
                    tick.remove();
                }
                self.cancel_fade_out();
                relm4::main_application().quit();
            }
        }
    }
}

impl AppModel {
    fn cancel_fade_out(&mut self) {
        if let Some(id) = self.fade_out.disarm() {
            id.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TimerSlot;

    #[test]
    fn test_fired_timer_cannot_be_disarmed_again() {
        let slot: TimerSlot<u32> = TimerSlot::new();
        assert!(slot.arm(1).is_none());

        // the timer fired and forgot its own handle; a movement event
        // processed afterwards must find nothing left to remove
        slot.mark_fired();
        assert_eq!(slot.disarm(), None);
    }

    #[test]
    fn test_rearming_hands_back_the_pending_timer() {
        let slot = TimerSlot::new();
        slot.arm(1u32);
        assert_eq!(slot.arm(2), Some(1));
        assert_eq!(slot.disarm(), Some(2));
        assert_eq!(slot.disarm(), None);
    }
}
