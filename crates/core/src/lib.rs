pub mod detection {
    pub mod domain {
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod rendering {
    pub mod domain {
        pub mod presenter;
    }
    pub mod infrastructure;
}

pub mod selection {
    pub mod domain {
        pub mod click_inbox;
        pub mod render_instruction;
        pub mod selection_controller;
        pub mod track_state;
    }
}

pub mod session {
    pub mod session_logger;
    pub mod track_session_use_case;
}

pub mod settings;

pub mod shared {
    pub mod bounding_box;
    pub mod constants;
    pub mod frame;
    pub mod video_metadata;
}

pub mod steering {
    pub mod domain {
        pub mod unit_converter;
        pub mod yaw_controller;
    }
    pub mod infrastructure;
}

pub mod tracking {
    pub mod domain {
        pub mod object_tracker;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod image_writer;
        pub mod video_reader;
    }
    pub mod infrastructure {
        pub mod ffmpeg_reader;
        pub mod image_file_writer;
    }
}
